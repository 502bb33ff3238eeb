use std::path::Path;

use anyhow::Context;
use reqwest::Method;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

/// Accept either a bare array or an `{entries: [...]}` document.
pub fn batch_from(document: Value) -> Value {
    match document {
        Value::Object(mut object) if object.contains_key("entries") => {
            object.remove("entries").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub async fn handle(client: &ApiClient, file: &Path, secret: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let document: Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", file.display()))?;
    let entries = batch_from(document);
    let count = entries.as_array().map_or(0, Vec::len);

    let request = client
        .public(Method::POST, "/entries/bulk")?
        .header("x-password", secret)
        .json(&json!({ "entries": entries }));
    let response = client.send(request).await?;

    let saved = response["entryIds"].as_array().map_or(0, Vec::len);
    let message = format!("Sent {} entries, {} saved", count, saved);
    output_success(output_format, &message, Some(response))
}
