use anyhow::Context;
use tracing_subscriber::EnvFilter;

use scout_api::config::AppConfig;
use scout_api::database::DatabaseManager;
use scout_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = scout_api::config::config().clone();
    config.validate().context("invalid configuration")?;
    tracing::info!(
        "Starting Scout API in {:?} mode ({} store)",
        config.environment,
        config.store.backend.as_str()
    );
    if config.security.ingest_secret.is_none() {
        tracing::warn!("INGEST_SECRET not set; bulk ingest will reject every request");
    }

    let store = DatabaseManager::open(&config.store)
        .await
        .context("failed to open document store")?;

    let port = config.server.port;
    let state = AppState::new(config, store).context("invalid password hashing parameters")?;
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Scout API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Scout API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
