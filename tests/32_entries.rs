mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn scouter_manages_entries() -> Result<()> {
    let app = TestApp::initialized().await?;
    app.create_user("kim", "scoutpass", Some("scouter"), json!([])).await?;
    let kim = ("kim", "scoutpass");

    let created = app
        .as_user(kim, Method::POST, "/entries", Some(json!({ "data": { "climb": "deep" } })))
        .await?;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["entryId"].as_str().unwrap_or_default().to_string();

    let fetched = app.as_user(kim, Method::GET, &format!("/entries/{}", id), None).await?;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["entry"]["data"], json!({ "climb": "deep" }));
    let first_stamp = fetched.body["entry"]["timestamp"].clone();
    assert!(first_stamp.is_string());

    let updated = app
        .as_user(
            kim,
            Method::PUT,
            &format!("/entries/{}", id),
            Some(json!({ "data": { "climb": "park" } })),
        )
        .await?;
    assert_eq!(updated.status, StatusCode::OK);

    let fetched = app.as_user(kim, Method::GET, &format!("/entries/{}", id), None).await?;
    assert_eq!(fetched.body["entry"]["data"], json!({ "climb": "park" }));

    let list = app.as_user(kim, Method::GET, "/entries", None).await?;
    assert_eq!(list.body["entries"].as_array().map(Vec::len), Some(1));

    let deleted = app.as_user(kim, Method::DELETE, &format!("/entries/{}", id), None).await?;
    assert_eq!(deleted.status, StatusCode::OK);
    let again = app.as_user(kim, Method::DELETE, &format!("/entries/{}", id), None).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn entry_routes_need_credentials() -> Result<()> {
    let app = TestApp::initialized().await?;

    let res = app.call(Method::GET, "/entries", &[], None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .call(
            Method::GET,
            "/entries",
            &[("username", "admin"), ("password", "nope")],
            None,
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn read_only_user_cannot_write_entries() -> Result<()> {
    let app = TestApp::initialized().await?;
    app.create_user(
        "analyst",
        "pass",
        None,
        json!([{ "name": "entries", "read": true, "write": false }]),
    )
    .await?;
    let analyst = ("analyst", "pass");

    let list = app.as_user(analyst, Method::GET, "/entries", None).await?;
    assert_eq!(list.status, StatusCode::OK);

    let create = app
        .as_user(analyst, Method::POST, "/entries", Some(json!({ "data": {} })))
        .await?;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn create_requires_data() -> Result<()> {
    let app = TestApp::initialized().await?;
    let res = app
        .as_admin(Method::POST, "/entries", Some(json!({ "notes": "no data field" })))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"].get("data").is_some());
    Ok(())
}

#[tokio::test]
async fn update_of_missing_entry_is_not_found() -> Result<()> {
    let app = TestApp::initialized().await?;
    let res = app
        .as_admin(
            Method::PUT,
            &format!("/entries/{}", uuid::Uuid::new_v4()),
            Some(json!({ "data": {} })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.as_admin(Method::GET, "/entries/12345", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
