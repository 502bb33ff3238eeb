use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Scout API (Rust)",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "POST /auth/login (public)",
            "initialize": "GET /initialize (public, idempotent)",
            "health": "GET /health (public)",
            "users": "/users[/:id[/permissions]] (users permission)",
            "schemas": "/schemas[/:id] (schemas permission)",
            "entries": "/entries[/:id] (entries permission)",
            "bulk": "POST /entries/bulk (x-password shared secret)"
        }
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": state.config.store.backend.as_str()
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": state.config.store.backend.as_str()
                })),
            )
        }
    }
}

/// GET /initialize - make sure the configured admin account exists
pub async fn initialize(State(state): State<AppState>) -> ApiResult<Value> {
    let security = &state.config.security;
    let created = state
        .credentials
        .ensure_admin(&security.admin_username, &security.admin_password)
        .await?;

    if created {
        info!("Initialized admin user '{}'", security.admin_username);
    }

    Ok(ApiResponse::success(json!({
        "message": "User collection initialized successfully",
        "created": created
    })))
}
