//! Bulk ingest endpoint used by field-collection clients.
//!
//! This route sits outside the per-user gate. It trusts a single shared secret sent in
//! `x-password`, which is a lower-assurance boundary than user credentials: anyone
//! holding the secret can write entries, and nothing else.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::BulkIngestor;

use super::json_body;

pub const SECRET_HEADER: &str = "x-password";

/// Compare digests so the check does not short-circuit on the first differing byte.
fn secret_matches(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}

fn check_secret(headers: &HeaderMap, configured: Option<&str>) -> Result<(), ApiError> {
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing ingest secret"))?;

    match configured {
        Some(expected) if !expected.is_empty() && secret_matches(provided, expected) => Ok(()),
        Some(_) => {
            warn!("Bulk ingest rejected: wrong secret");
            Err(ApiError::forbidden("Invalid ingest secret"))
        }
        None => {
            warn!("Bulk ingest rejected: no ingest secret configured");
            Err(ApiError::forbidden("Bulk ingest is disabled"))
        }
    }
}

/// POST /entries/bulk - `{entries: [...]}`
pub async fn bulk(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    check_secret(&headers, state.config.security.ingest_secret.as_deref())?;

    let body = json_body(payload)?;
    let entries = body.get("entries").unwrap_or(&Value::Null);

    let outcome = BulkIngestor::new(state.store.clone()).ingest(entries).await?;

    if outcome.is_nothing_new() {
        return Ok(ApiResponse::success(json!({
            "message": "No new entries",
            "entryIds": []
        })));
    }

    Ok(ApiResponse::created(json!({
        "message": "Entries saved",
        "entryIds": outcome.touched
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn with_secret(secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SECRET_HEADER, HeaderValue::from_str(secret).unwrap());
        headers
    }

    #[test]
    fn missing_secret_is_unauthenticated() {
        let err = check_secret(&HeaderMap::new(), Some("field-secret")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn wrong_or_unconfigured_secret_is_forbidden() {
        let err = check_secret(&with_secret("guess"), Some("field-secret")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = check_secret(&with_secret("field-secret"), None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = check_secret(&with_secret(""), Some("")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn matching_secret_passes() {
        assert!(check_secret(&with_secret("field-secret"), Some("field-secret")).is_ok());
    }
}
