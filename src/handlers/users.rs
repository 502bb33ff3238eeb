use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::auth::{Permission, Role};
use crate::database::models::UserView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::NewUser;

use super::{json_body, parse_id};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub permissions: Option<Vec<Permission>>,
}

/// GET /users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserView>> {
    let users = state.credentials.list().await?;
    Ok(ApiResponse::success(users.iter().map(UserView::from).collect()))
}

/// POST /users - admin-only account creation
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let request = json_body(payload)?;
    let (Some(username), Some(password), Some(permissions)) =
        (request.username, request.password, request.permissions)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let user = state
        .credentials
        .create(NewUser {
            username,
            password,
            role: request.role,
            permissions,
        })
        .await?;

    info!("'{}' created user '{}'", actor.username, user.username);
    Ok(ApiResponse::created(json!({
        "message": "User created",
        "userId": user.id
    })))
}

/// GET /users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserView> {
    let id = parse_id(&id, "User")?;
    let user = state
        .credentials
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(UserView::from(&user)))
}

/// DELETE /users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "User")?;
    if !state.credentials.delete(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!("'{}' deleted user {}", actor.username, id);
    Ok(ApiResponse::success(json!({ "message": "User deleted successfully" })))
}

/// PUT /users/:id/permissions - replace the whole permission list
pub async fn replace_permissions(
    State(state): State<AppState>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<PermissionsRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "User")?;
    let permissions = json_body(payload)?
        .permissions
        .ok_or_else(|| ApiError::field_error("permissions", "This field is required", "Missing required fields"))?;

    if !state.credentials.replace_permissions(id, permissions).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!("'{}' replaced permissions of user {}", actor.username, id);
    Ok(ApiResponse::success(json!({ "message": "Permissions updated successfully" })))
}
