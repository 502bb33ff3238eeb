mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{scouting_entry, TestApp, INGEST_SECRET};

fn entry_ids(body: &Value) -> Vec<String> {
    body["entryIds"]
        .as_array()
        .map(|ids| ids.iter().filter_map(|id| id.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn bulk_insert_returns_ids() -> Result<()> {
    let app = TestApp::initialized().await?;
    let res = app
        .ingest(json!([scouting_entry(1, 5987, 100), scouting_entry(1, 254, 100)]))
        .await?;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(entry_ids(&res.body).len(), 2);

    let list = app.as_admin(Method::GET, "/entries", None).await?;
    let stored = list.body["entries"].as_array().cloned().unwrap_or_default();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|e| e["receivedAt"].is_string()));
    Ok(())
}

#[tokio::test]
async fn resubmission_is_nothing_new() -> Result<()> {
    let app = TestApp::initialized().await?;
    let batch = json!([scouting_entry(1, 5987, 100), scouting_entry(2, 5987, 110)]);

    let first = app.ingest(batch.clone()).await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app.ingest(batch).await?;
    assert_eq!(second.status, StatusCode::OK);
    assert!(entry_ids(&second.body).is_empty());

    let list = app.as_admin(Method::GET, "/entries", None).await?;
    assert_eq!(list.body["entries"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_batches_store_each_key_once() -> Result<()> {
    let app = Arc::new(TestApp::initialized().await?);

    let mut tasks = Vec::new();
    for n in 0..8 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            app.ingest(json!([scouting_entry(3, 5987, 100 + n)])).await
        }));
    }
    for task in tasks {
        assert!(task.await??.status.is_success());
    }

    let list = app.as_admin(Method::GET, "/entries", None).await?;
    assert_eq!(list.body["entries"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn newest_submission_wins() -> Result<()> {
    let app = TestApp::initialized().await?;
    let first = app.ingest(json!([scouting_entry(1, 5987, 100)])).await?;
    let id = entry_ids(&first.body).remove(0);

    let stale = app.ingest(json!([scouting_entry(1, 5987, 50)])).await?;
    assert_eq!(stale.status, StatusCode::OK);
    assert!(entry_ids(&stale.body).is_empty());

    let mut newer = scouting_entry(1, 5987, 150);
    newer["endgame"] = json!("deep");
    let fresh = app.ingest(json!([newer])).await?;
    assert_eq!(fresh.status, StatusCode::CREATED);
    assert_eq!(entry_ids(&fresh.body), vec![id.clone()]);

    let stored = app.as_admin(Method::GET, &format!("/entries/{}", id), None).await?;
    assert_eq!(stored.body["entry"]["submittedAt"], 150);
    assert_eq!(stored.body["entry"]["endgame"], "deep");
    Ok(())
}

#[tokio::test]
async fn one_bad_entry_rejects_the_batch() -> Result<()> {
    let app = TestApp::initialized().await?;
    let mut bad = scouting_entry(4, 5987, 100);
    if let Some(object) = bad.as_object_mut() {
        object.remove("teamNumber");
    }

    let res = app
        .ingest(json!([
            scouting_entry(1, 5987, 100),
            scouting_entry(2, 5987, 100),
            scouting_entry(3, 5987, 100),
            bad
        ]))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"].get("teamNumber").is_some());

    let list = app.as_admin(Method::GET, "/entries", None).await?;
    assert_eq!(list.body["entries"], json!([]));
    Ok(())
}

#[tokio::test]
async fn invalid_shapes_are_bad_requests() -> Result<()> {
    let app = TestApp::initialized().await?;

    let empty = app.ingest(json!([])).await?;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let object = app.ingest(json!({ "matchNumber": 1 })).await?;
    assert_eq!(object.status, StatusCode::BAD_REQUEST);

    let nulls = app.ingest(json!([null])).await?;
    assert_eq!(nulls.status, StatusCode::BAD_REQUEST);

    let mut off_enum = scouting_entry(1, 5987, 100);
    off_enum["alliance"] = json!("purple");
    let res = app.ingest(json!([off_enum])).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let missing = app
        .call(
            Method::POST,
            "/entries/bulk",
            &[("x-password", INGEST_SECRET)],
            Some(json!({})),
        )
        .await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn shared_secret_is_enforced() -> Result<()> {
    let app = TestApp::initialized().await?;
    let body = Some(json!({ "entries": [scouting_entry(1, 5987, 100)] }));

    let missing = app.call(Method::POST, "/entries/bulk", &[], body.clone()).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let wrong = app
        .call(Method::POST, "/entries/bulk", &[("x-password", "guess")], body.clone())
        .await?;
    assert_eq!(wrong.status, StatusCode::FORBIDDEN);

    // user credentials do not stand in for the secret
    let user = app
        .call(
            Method::POST,
            "/entries/bulk",
            &[("username", "admin"), ("password", "adminpass")],
            body,
        )
        .await?;
    assert_eq!(user.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unconfigured_secret_disables_ingest() -> Result<()> {
    let mut config = TestApp::config();
    config.security.ingest_secret = None;
    let app = TestApp::with_config(config);

    let res = app
        .call(
            Method::POST,
            "/entries/bulk",
            &[("x-password", INGEST_SECRET)],
            Some(json!({ "entries": [scouting_entry(1, 5987, 100)] })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn preflight_allows_any_origin() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .call(
            Method::OPTIONS,
            "/entries/bulk",
            &[
                ("origin", "https://field.example.org"),
                ("access-control-request-method", "POST"),
                ("access-control-request-headers", "content-type,x-password"),
            ],
            None,
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(header(&res, "access-control-allow-origin"), "*");
    assert!(header(&res, "access-control-allow-methods").contains("POST"));
    assert!(header(&res, "access-control-allow-headers").contains("x-password"));

    // the ingest response itself carries the wildcard origin too
    let res = app
        .call(
            Method::POST,
            "/entries/bulk",
            &[("origin", "https://field.example.org"), ("x-password", INGEST_SECRET)],
            Some(json!({ "entries": [scouting_entry(1, 5987, 100)] })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(header(&res, "access-control-allow-origin"), "*");
    Ok(())
}

fn header<'a>(res: &'a common::TestResponse, name: &str) -> &'a str {
    res.headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn bulk_path_takes_priority_over_entry_ids() -> Result<()> {
    let app = TestApp::initialized().await?;
    let res = app.as_admin(Method::GET, "/entries/bulk", None).await?;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
