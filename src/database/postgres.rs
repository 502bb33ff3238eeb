use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::store::{Document, DocumentStore, Fields, StoreError};

const CREATE_DOCUMENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection  TEXT        NOT NULL,
        id          UUID        NOT NULL,
        body        JSONB       NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
"#;

const CREATE_USERNAME_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS documents_users_username
        ON documents ((body->>'username'))
        WHERE collection = 'users'
"#;

const CREATE_ENTRY_KEY_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS documents_entries_match_team
        ON documents ((body->>'matchNumber'), (body->>'teamNumber'))
        WHERE collection = 'entries' AND body ? 'matchNumber'
"#;

/// JSONB document store over a shared connection pool
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the documents table and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_DOCUMENTS)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        for index in [CREATE_USERNAME_INDEX, CREATE_ENTRY_KEY_INDEX] {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(classify)?;
        }
        Ok(())
    }

    fn to_document(collection: &str, row: PgRow) -> Result<Document, StoreError> {
        let id: Uuid = row.try_get("id")?;
        let body: Value = row.try_get("body")?;
        match body {
            Value::Object(map) => Ok(Document::new(id, map)),
            other => Err(StoreError::Malformed {
                collection: collection.to_string(),
                id,
                reason: format!("expected object body, found {}", other),
            }),
        }
    }
}

/// Split sqlx errors into the cases callers react to differently.
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::ConnectionError(err.to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, body FROM documents WHERE collection = $1 ORDER BY created_at, id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.into_iter()
            .map(|row| Self::to_document(collection, row))
            .collect()
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        row.map(|row| Self::to_document(collection, row)).transpose()
    }

    async fn find_one(&self, collection: &str, filter: &Fields) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT id, body FROM documents WHERE collection = $1 AND body @> $2 \
             ORDER BY created_at, id LIMIT 1",
        )
        .bind(collection)
        .bind(Value::Object(filter.clone()))
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(|row| Self::to_document(collection, row)).transpose()
    }

    async fn insert(&self, collection: &str, body: Fields) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(Value::Object(body))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(id)
    }

    // The NOT EXISTS guard covers collections without a unique index; the
    // username and entry-key indexes close the race for the ones that have one.
    async fn insert_unique(
        &self,
        collection: &str,
        key: &Fields,
        body: Fields,
    ) -> Result<Option<Uuid>, StoreError> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, body) \
             SELECT $1, $2, $3 \
             WHERE NOT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND body @> $4)",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(body))
        .bind(Value::Object(key.clone()))
        .execute(&self.pool)
        .await
        .map_err(classify);

        match result {
            Ok(done) if done.rows_affected() > 0 => Ok(Some(id)),
            Ok(_) | Err(StoreError::Conflict(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, collection: &str, id: Uuid, changes: Fields) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = body || $3 WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(changes))
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace(&self, collection: &str, id: Uuid, body: Fields) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .bind(Value::Object(body))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}
