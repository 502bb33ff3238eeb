use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::json_body;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub role: Option<Role>,
    pub token: String,
    pub expires_in: u64,
}

/// POST /auth/login - exchange username + password for a role and bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let request = json_body(payload)?;
    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(ApiError::bad_request("username and password are required"));
    };

    let Some(user) = state.credentials.authenticate(&username, &password).await? else {
        warn!("Login failed for '{}'", username);
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let token = state.tokens.issue(&user)?;
    info!("User '{}' logged in", user.username);

    Ok(ApiResponse::success(LoginResponse {
        role: user.role,
        token,
        expires_in: state.tokens.expires_in_secs(),
    }))
}
