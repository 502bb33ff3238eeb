use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Field map of a stored document (everything except its identifier)
pub type Fields = Map<String, Value>;

/// Errors from the document store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Malformed document {id} in {collection}: {reason}")]
    Malformed {
        collection: String,
        id: Uuid,
        reason: String,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A stored record: server-assigned id plus free-form fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub body: Fields,
}

impl Document {
    pub fn new(id: Uuid, body: Fields) -> Self {
        Self { id, body }
    }

    /// Client representation: the fields with `id` folded in.
    pub fn into_json(self) -> Value {
        let mut body = self.body;
        body.insert("id".to_string(), Value::String(self.id.to_string()));
        Value::Object(body)
    }

    /// True when every filter field is present with an equal value.
    pub fn matches(&self, filter: &Fields) -> bool {
        filter
            .iter()
            .all(|(key, expected)| self.body.get(key) == Some(expected))
    }
}

/// Collection-oriented document API shared by every backend.
///
/// Each call is a single atomic operation on one document; nothing here spans
/// several documents transactionally.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection in insertion order.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// First document (insertion order) whose fields equal every filter entry.
    async fn find_one(&self, collection: &str, filter: &Fields) -> Result<Option<Document>, StoreError>;

    /// Insert a new document and return its generated id.
    async fn insert(&self, collection: &str, body: Fields) -> Result<Uuid, StoreError>;

    /// Insert unless a document already matches `key`, as one atomic step.
    /// Returns `None` when a match exists and nothing was written.
    async fn insert_unique(
        &self,
        collection: &str,
        key: &Fields,
        body: Fields,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Overwrite the given fields, leaving the others untouched.
    /// Returns false when no document has that id.
    async fn update(&self, collection: &str, id: Uuid, changes: Fields) -> Result<bool, StoreError>;

    /// Replace all fields of a document, keeping its id.
    async fn replace(&self, collection: &str, id: Uuid, body: Fields) -> Result<bool, StoreError>;

    /// Returns false when nothing was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Connectivity check used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn into_json_includes_id() {
        let id = Uuid::new_v4();
        let doc = Document::new(id, fields(json!({ "name": "pit" })));
        let value = doc.into_json();
        assert_eq!(value["id"], json!(id.to_string()));
        assert_eq!(value["name"], json!("pit"));
    }

    #[test]
    fn matches_requires_every_filter_field() {
        let doc = Document::new(
            Uuid::new_v4(),
            fields(json!({ "matchNumber": 1, "teamNumber": 5987, "alliance": "red" })),
        );
        assert!(doc.matches(&fields(json!({ "matchNumber": 1, "teamNumber": 5987 }))));
        assert!(!doc.matches(&fields(json!({ "matchNumber": 1, "teamNumber": 254 }))));
        assert!(!doc.matches(&fields(json!({ "scouterName": "kim" }))));
        assert!(doc.matches(&Fields::new()));
    }
}
