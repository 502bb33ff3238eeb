use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::memory::MemoryStore;
use super::postgres::PostgresStore;
use super::store::{DocumentStore, StoreError};
use crate::config::{StoreBackend, StoreConfig};

/// Builds the one store handle the process shares for its whole lifetime
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open the configured backend. Called once at startup.
    pub async fn open(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory document store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreBackend::Postgres => {
                let pool = Self::connect(config).await?;
                let store = PostgresStore::new(pool);
                store.ensure_schema().await?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Create the shared connection pool
    pub async fn connect(config: &StoreConfig) -> Result<PgPool, StoreError> {
        let connection_string = config
            .database_url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let url = url::Url::parse(connection_string).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(connection_string)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!(
            "Created database pool for {} (max {} connections)",
            Self::redacted(&url),
            config.max_connections
        );
        Ok(pool)
    }

    /// Host and database name only, for logs
    fn redacted(url: &url::Url) -> String {
        format!("{}{}", url.host_str().unwrap_or("localhost"), url.path())
    }
}
