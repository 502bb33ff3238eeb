//! Per-collection permission model.
//!
//! A user holds at most one [`Permission`] per collection name. Access is decided
//! from that table alone; [`Role`] only seeds the table when a user is created.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::database::models::User;

/// What a request wants to do with a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Write => write!(f, "write"),
        }
    }
}

/// Resource categories guarded by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Entries,
    Schemas,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Entries, Collection::Schemas, Collection::Users];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Entries => "entries",
            Collection::Schemas => "schemas",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability set for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

impl Permission {
    pub fn new(name: impl Into<String>, read: bool, write: bool) -> Self {
        Self {
            name: name.into(),
            read,
            write,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read,
            Action::Write => self.write,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Scouter,
    HeadScouter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Scouter => "scouter",
            Role::HeadScouter => "head-scouter",
            Role::Admin => "admin",
        }
    }

    /// Permission table a new user with this role starts from.
    pub fn default_permissions(&self) -> Vec<Permission> {
        match self {
            Role::Scouter => vec![Permission::new(Collection::Entries.as_str(), true, true)],
            Role::HeadScouter => vec![
                Permission::new(Collection::Entries.as_str(), true, true),
                Permission::new(Collection::Schemas.as_str(), true, false),
            ],
            Role::Admin => Collection::ALL
                .iter()
                .map(|c| Permission::new(c.as_str(), true, true))
                .collect(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow iff the user's entry for `collection` grants `action`. No entry denies.
pub fn has_permission(user: &User, collection: &str, action: Action) -> bool {
    user.permissions
        .iter()
        .find(|p| p.name == collection)
        .map_or(false, |p| p.allows(action))
}

/// First collection name that appears more than once, if any.
pub fn find_duplicate(permissions: &[Permission]) -> Option<&str> {
    permissions.iter().enumerate().find_map(|(i, p)| {
        permissions[..i]
            .iter()
            .any(|earlier| earlier.name == p.name)
            .then_some(p.name.as_str())
    })
}

/// Role template overlaid with explicit entries. Explicit entries win per collection.
pub fn with_role_defaults(role: Option<Role>, explicit: Vec<Permission>) -> Vec<Permission> {
    let mut merged = role.map(|r| r.default_permissions()).unwrap_or_default();
    for permission in explicit {
        match merged.iter_mut().find(|p| p.name == permission.name) {
            Some(existing) => *existing = permission,
            None => merged.push(permission),
        }
    }
    merged
}
