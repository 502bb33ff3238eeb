// handlers/mod.rs - one module per resource
//
// Public routes (login, initialize, health) take no credentials. Collection routes are
// wrapped with `with_auth` in `app::router`; the bulk ingest route checks its own shared
// secret.
pub mod auth;
pub mod entries;
pub mod ingest;
pub mod schemas;
pub mod system;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// Unparseable ids cannot name a stored document, so they read as "not found".
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

/// Unwrap a JSON body, mapping extractor rejections to `INVALID_JSON`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(body) = payload?;
    Ok(body)
}

/// Field present and not null
pub(crate) fn require_field<'a>(body: &'a Value, field: &str) -> Result<&'a Value, ApiError> {
    match body.get(field) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ApiError::field_error(field, "This field is required", "Missing required fields")),
    }
}
