#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use scout_api::config::{AppConfig, StoreBackend};
use scout_api::database::MemoryStore;
use scout_api::{router, AppState};

pub const ADMIN: (&str, &str) = ("admin", "adminpass");
pub const INGEST_SECRET: &str = "field-secret";

/// In-process server over a fresh memory store
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn config() -> AppConfig {
        let mut config = AppConfig::development();
        config.store.backend = StoreBackend::Memory;
        config.security.jwt_secret = "test-secret".to_string();
        config.security.ingest_secret = Some(INGEST_SECRET.to_string());
        config.security.admin_username = ADMIN.0.to_string();
        config.security.admin_password = ADMIN.1.to_string();
        // cheap hashing keeps the suite fast
        config.security.hash_memory_kib = 64;
        config.security.hash_iterations = 1;
        config
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new())).expect("valid hashing params");
        Self {
            router: router(state.clone()),
            state,
        }
    }

    pub fn new() -> Self {
        Self::with_config(Self::config())
    }

    /// Fresh app with the default admin already created
    pub async fn initialized() -> Result<Self> {
        let app = Self::new();
        let res = app.call(Method::GET, "/initialize", &[], None).await?;
        assert_eq!(res.status, StatusCode::OK);
        Ok(app)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(TestResponse { status, headers, body })
    }

    /// Request authenticated with username / password headers
    pub async fn as_user(
        &self,
        (username, password): (&str, &str),
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        self.call(method, uri, &[("username", username), ("password", password)], body)
            .await
    }

    pub async fn as_admin(&self, method: Method, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        self.as_user(ADMIN, method, uri, body).await
    }

    /// Create a user through the API and return its id
    pub async fn create_user(&self, username: &str, password: &str, role: Option<&str>, permissions: Value) -> Result<String> {
        let res = self
            .as_admin(
                Method::POST,
                "/users",
                Some(json!({
                    "username": username,
                    "password": password,
                    "role": role,
                    "permissions": permissions
                })),
            )
            .await?;
        assert_eq!(res.status, StatusCode::CREATED, "create user failed: {}", res.body);
        Ok(res.body["userId"].as_str().unwrap_or_default().to_string())
    }

    pub async fn ingest(&self, entries: Value) -> Result<TestResponse> {
        self.call(
            Method::POST,
            "/entries/bulk",
            &[("x-password", INGEST_SECRET)],
            Some(json!({ "entries": entries })),
        )
        .await
    }
}

/// Valid bulk entry with the given key and submission time
pub fn scouting_entry(match_number: u64, team_number: u64, submitted_at: i64) -> Value {
    json!({
        "scouterName": "kim",
        "matchNumber": match_number,
        "teamNumber": team_number,
        "alliance": "blue",
        "startPosition": "left",
        "endgame": "shallow",
        "defense": "light",
        "submittedAt": submitted_at,
        "autoNotes": 3
    })
}
