use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{find_duplicate, with_role_defaults, PasswordError, PasswordPolicy, Permission, Role};
use crate::database::models::User;
use crate::database::store::{DocumentStore, Fields, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Duplicate permission entry for collection '{0}'")]
    DuplicatePermission(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for the admin-only create operation
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
}

/// User records over whichever document store was configured at startup
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn DocumentStore>,
    passwords: PasswordPolicy,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn DocumentStore>, passwords: PasswordPolicy) -> Self {
        Self { store, passwords }
    }

    /// Username + secret to user, or `None` when either does not match.
    pub async fn authenticate(&self, username: &str, secret: &str) -> Result<Option<User>, StoreError> {
        if secret.is_empty() {
            return Ok(None);
        }
        let Some(user) = self.find_by_username(username).await? else {
            debug!("Authentication failed: unknown user '{}'", username);
            return Ok(None);
        };

        if self.passwords.verify(secret, &user.password_hash).await {
            Ok(Some(user))
        } else {
            debug!("Authentication failed: bad secret for '{}'", username);
            Ok(None)
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let filter = username_filter(username);
        self.store
            .find_one(User::COLLECTION, &filter)
            .await?
            .map(User::from_document)
            .transpose()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.store
            .find_by_id(User::COLLECTION, id)
            .await?
            .map(User::from_document)
            .transpose()
    }

    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.store
            .find_all(User::COLLECTION)
            .await?
            .into_iter()
            .map(User::from_document)
            .collect()
    }

    /// Hash the password, apply the role template and persist.
    ///
    /// The username check and the write happen in one store call, so two
    /// concurrent creates for the same name cannot both succeed.
    pub async fn create(&self, new_user: NewUser) -> Result<User, CredentialError> {
        if let Some(name) = find_duplicate(&new_user.permissions) {
            return Err(CredentialError::DuplicatePermission(name.to_string()));
        }

        let mut user = User {
            id: Uuid::nil(),
            password_hash: self.passwords.hash(&new_user.password).await?,
            permissions: with_role_defaults(new_user.role, new_user.permissions),
            role: new_user.role,
            username: new_user.username,
            created_at: Utc::now(),
        };

        let inserted = self
            .store
            .insert_unique(User::COLLECTION, &username_filter(&user.username), user.to_fields())
            .await?;
        let Some(id) = inserted else {
            return Err(CredentialError::UsernameTaken(user.username));
        };
        user.id = id;

        info!("Created user '{}' ({})", user.username, user.id);
        Ok(user)
    }

    /// Swap the whole permission list. Returns false when the user does not exist.
    pub async fn replace_permissions(
        &self,
        id: Uuid,
        permissions: Vec<Permission>,
    ) -> Result<bool, CredentialError> {
        if let Some(name) = find_duplicate(&permissions) {
            return Err(CredentialError::DuplicatePermission(name.to_string()));
        }

        let mut changes = Fields::new();
        changes.insert("permissions".to_string(), json!(permissions));
        Ok(self.store.update(User::COLLECTION, id, changes).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.delete(User::COLLECTION, id).await
    }

    /// Create the admin account unless a user with that name already exists.
    /// Returns true when a user was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        if self.find_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let created = self
            .create(NewUser {
                username: username.to_string(),
                password: password.to_string(),
                role: Some(Role::Admin),
                permissions: vec![],
            })
            .await;

        match created {
            Ok(_) => Ok(true),
            // a concurrent initialize got there first
            Err(CredentialError::UsernameTaken(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn username_filter(username: &str) -> Fields {
    let mut filter = Fields::new();
    filter.insert("username".to_string(), Value::String(username.to_string()));
    filter
}
