use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::Fields;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ingest::ENTRIES;

use super::{json_body, parse_id, require_field};

/// GET /entries - generic and bulk-ingested entries alike
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let entries: Vec<Value> = state
        .store
        .find_all(ENTRIES)
        .await?
        .into_iter()
        .map(|doc| doc.into_json())
        .collect();

    Ok(ApiResponse::success(json!({
        "message": "Entries fetched successfully",
        "entries": entries
    })))
}

fn timestamped(data: Value) -> Fields {
    let mut fields = Fields::new();
    fields.insert("timestamp".to_string(), json!(Utc::now()));
    fields.insert("data".to_string(), data);
    fields
}

/// POST /entries - `{data}` stored with a server timestamp
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(payload)?;
    let data = require_field(&body, "data")?.clone();

    let id = state.store.insert(ENTRIES, timestamped(data)).await?;
    Ok(ApiResponse::created(json!({
        "message": "Entry created",
        "entryId": id
    })))
}

/// GET /entries/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "Entry")?;
    let entry = state
        .store
        .find_by_id(ENTRIES, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Entry not found"))?;

    Ok(ApiResponse::success(json!({
        "message": "Entry fetched successfully",
        "entry": entry.into_json()
    })))
}

/// PUT /entries/:id - replace `data`, refreshing `timestamp`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "Entry")?;
    let body = json_body(payload)?;
    let data = require_field(&body, "data")?.clone();

    if !state.store.update(ENTRIES, id, timestamped(data)).await? {
        return Err(ApiError::not_found("Entry not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Entry updated successfully" })))
}

/// DELETE /entries/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "Entry")?;
    if !state.store.delete(ENTRIES, id).await? {
        return Err(ApiError::not_found("Entry not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Entry deleted successfully" })))
}
