use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{Permission, Role};
use crate::database::store::{Document, Fields, StoreError};

/// Stored user record. `password_hash` never leaves the server; clients get [`UserView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        let id = doc.id;
        let mut user: User =
            serde_json::from_value(Value::Object(doc.body)).map_err(|e| StoreError::Malformed {
                collection: Self::COLLECTION.to_string(),
                id,
                reason: e.to_string(),
            })?;
        user.id = id;
        Ok(user)
    }

    pub fn to_fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct with named fields always serializes to an object
            _ => Fields::new(),
        }
    }
}

/// Client-facing user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            permissions: user.permissions.clone(),
            created_at: user.created_at,
        }
    }
}
