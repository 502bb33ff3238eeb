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

use super::{json_body, parse_id, require_field};

const SCHEMAS: &str = "schemas";

/// GET /schemas
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let schemas: Vec<Value> = state
        .store
        .find_all(SCHEMAS)
        .await?
        .into_iter()
        .map(|doc| doc.into_json())
        .collect();

    Ok(ApiResponse::success(json!({
        "message": "Schemas fetched successfully",
        "schemas": schemas
    })))
}

/// POST /schemas - `{name, schema}`; the schema document itself is stored as given
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(payload)?;
    let name = require_field(&body, "name")?.clone();
    let schema = require_field(&body, "schema")?.clone();

    let mut fields = Fields::new();
    fields.insert("name".to_string(), name);
    fields.insert("schema".to_string(), schema);
    fields.insert("createdAt".to_string(), json!(Utc::now()));

    let id = state.store.insert(SCHEMAS, fields).await?;
    Ok(ApiResponse::created(json!({
        "message": "Schema created",
        "schemaId": id
    })))
}

/// GET /schemas/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "Schema")?;
    let schema = state
        .store
        .find_by_id(SCHEMAS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Schema not found"))?;

    Ok(ApiResponse::success(json!({
        "message": "Schema fetched successfully",
        "schema": schema.into_json()
    })))
}

/// PUT /schemas/:id - replace `schema` and/or `name`, stamping `updatedAt`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "Schema")?;
    let body = json_body(payload)?;

    let mut changes = Fields::new();
    for field in ["name", "schema"] {
        if let Some(value) = body.get(field).filter(|v| !v.is_null()) {
            changes.insert(field.to_string(), value.clone());
        }
    }
    if changes.is_empty() {
        return Err(ApiError::field_error("schema", "This field is required", "Missing required fields"));
    }
    changes.insert("updatedAt".to_string(), json!(Utc::now()));

    if !state.store.update(SCHEMAS, id, changes).await? {
        return Err(ApiError::not_found("Schema not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Schema updated successfully" })))
}

/// DELETE /schemas/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "Schema")?;
    if !state.store.delete(SCHEMAS, id).await? {
        return Err(ApiError::not_found("Schema not found"));
    }
    Ok(ApiResponse::success(json!({ "message": "Schema deleted successfully" })))
}
