//! Authorization gate wrapped around every protected route.
//!
//! A request carries either `username` / `password` headers or an
//! `Authorization: Bearer <token>` header. The gate resolves the stored user on
//! every request, checks the permission table for the route's collection and
//! action, and hands the user to the handler as an [`AuthUser`] extension.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use tracing::warn;

use crate::app::AppState;
use crate::auth::{has_permission, Action, Collection};
use crate::database::models::User;
use crate::error::ApiError;

/// User resolved by the gate for the current request
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { username: String, password: String },
    Bearer(String),
}

/// Requirement attached to one route
#[derive(Clone)]
pub struct Gate {
    pub state: AppState,
    pub collection: Collection,
    pub action: Action,
}

/// Bearer token wins when both forms are present.
pub fn extract_credentials(headers: &HeaderMap) -> Result<Option<Credentials>, ApiError> {
    if let Some(value) = headers.get("authorization") {
        let value = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer token format"))?
            .trim();
        if token.is_empty() {
            return Err(ApiError::unauthorized("Empty bearer token"));
        }
        return Ok(Some(Credentials::Bearer(token.to_string())));
    }

    match (header_str(headers, "username"), header_str(headers, "password")) {
        (Some(username), Some(password)) if !username.is_empty() => Ok(Some(Credentials::Password {
            username: username.to_string(),
            password: password.to_string(),
        })),
        _ => Ok(None),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Look up the stored user the credentials belong to.
pub async fn resolve_user(state: &AppState, credentials: Credentials) -> Result<Option<User>, ApiError> {
    match credentials {
        Credentials::Password { username, password } => {
            let user = state.credentials.authenticate(&username, &password).await?;
            if user.is_none() {
                warn!("Rejected credentials for '{}'", username);
            }
            Ok(user)
        }
        Credentials::Bearer(token) => {
            let claims = match state.tokens.validate(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    warn!("Rejected bearer token: {}", e);
                    return Ok(None);
                }
            };
            let user = state.credentials.find_by_username(&claims.sub).await?;
            if user.is_none() {
                warn!("Bearer token for unknown user '{}'", claims.sub);
            }
            Ok(user)
        }
    }
}

pub fn authorize(user: &User, collection: Collection, action: Action) -> Result<(), ApiError> {
    if has_permission(user, collection.as_str(), action) {
        Ok(())
    } else {
        warn!(
            "User '{}' denied {} on {}",
            user.username, action, collection
        );
        Err(ApiError::forbidden(format!(
            "Missing {} permission on {}",
            action, collection
        )))
    }
}

pub async fn gate(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = extract_credentials(request.headers())?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = resolve_user(&gate.state, credentials)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    authorize(&user, gate.collection, gate.action)?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// Wrap a method router so it only runs for users holding `action` on `collection`.
pub fn with_auth(
    route: MethodRouter<AppState>,
    state: &AppState,
    collection: Collection,
    action: Action,
) -> MethodRouter<AppState> {
    let requirement = Gate {
        state: state.clone(),
        collection,
        action,
    };
    route.route_layer(middleware::from_fn_with_state(requirement, gate))
}
