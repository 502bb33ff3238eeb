mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn schema_lifecycle() -> Result<()> {
    let app = TestApp::initialized().await?;

    let created = app
        .as_admin(
            Method::POST,
            "/schemas",
            Some(json!({ "name": "pit", "schema": { "fields": ["drivetrain", "weight"] } })),
        )
        .await?;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["schemaId"].as_str().unwrap_or_default().to_string();

    let fetched = app.as_admin(Method::GET, &format!("/schemas/{}", id), None).await?;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["schema"]["name"], "pit");
    assert_eq!(fetched.body["schema"]["id"], id.as_str());
    let created_at = fetched.body["schema"]["createdAt"].clone();

    let updated = app
        .as_admin(
            Method::PUT,
            &format!("/schemas/{}", id),
            Some(json!({ "schema": { "fields": ["drivetrain"] } })),
        )
        .await?;
    assert_eq!(updated.status, StatusCode::OK);

    let fetched = app.as_admin(Method::GET, &format!("/schemas/{}", id), None).await?;
    assert_eq!(fetched.body["schema"]["schema"], json!({ "fields": ["drivetrain"] }));
    assert_eq!(fetched.body["schema"]["createdAt"], created_at);
    assert!(fetched.body["schema"]["updatedAt"].is_string());

    let list = app.as_admin(Method::GET, "/schemas", None).await?;
    assert_eq!(list.body["schemas"].as_array().map(Vec::len), Some(1));

    let deleted = app.as_admin(Method::DELETE, &format!("/schemas/{}", id), None).await?;
    assert_eq!(deleted.status, StatusCode::OK);
    let gone = app.as_admin(Method::GET, &format!("/schemas/{}", id), None).await?;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn read_only_schema_access() -> Result<()> {
    let app = TestApp::initialized().await?;
    app.create_user("lee", "leepass", Some("head-scouter"), json!([])).await?;
    let lee = ("lee", "leepass");

    let list = app.as_user(lee, Method::GET, "/schemas", None).await?;
    assert_eq!(list.status, StatusCode::OK);

    let create = app
        .as_user(lee, Method::POST, "/schemas", Some(json!({ "name": "x", "schema": {} })))
        .await?;
    assert_eq!(create.status, StatusCode::FORBIDDEN);

    let delete = app
        .as_user(lee, Method::DELETE, &format!("/schemas/{}", uuid::Uuid::new_v4()), None)
        .await?;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn create_and_update_require_fields() -> Result<()> {
    let app = TestApp::initialized().await?;

    let res = app
        .as_admin(Method::POST, "/schemas", Some(json!({ "name": "pit" })))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let created = app
        .as_admin(Method::POST, "/schemas", Some(json!({ "name": "pit", "schema": {} })))
        .await?;
    let id = created.body["schemaId"].as_str().unwrap_or_default().to_string();

    let res = app
        .as_admin(Method::PUT, &format!("/schemas/{}", id), Some(json!({})))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_schema_is_not_found() -> Result<()> {
    let app = TestApp::initialized().await?;
    let id = uuid::Uuid::new_v4();

    let res = app.as_admin(Method::GET, &format!("/schemas/{}", id), None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .as_admin(Method::PUT, &format!("/schemas/{}", id), Some(json!({ "schema": {} })))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.as_admin(Method::DELETE, "/schemas/zzz", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = TestApp::initialized().await?;
    let res = app
        .as_admin(Method::POST, "/schemas", Some(json!("just a string")))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}
