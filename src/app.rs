use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::{Action, Collection, PasswordError, PasswordPolicy, TokenIssuer};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::DocumentStore;
use crate::handlers::{auth, entries, ingest, schemas, system, users};
use crate::middleware::with_auth;
use crate::services::CredentialStore;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub credentials: CredentialStore,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, PasswordError> {
        let passwords = PasswordPolicy::from_config(&config.security)?;
        Ok(Self {
            credentials: CredentialStore::new(store.clone(), passwords),
            tokens: TokenIssuer::from_config(&config.security),
            config: Arc::new(config),
            store,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .merge(user_routes(&state))
        .merge(schema_routes(&state))
        .merge(entry_routes(&state));
    let gated = match cors_layer(&state.config.security) {
        Some(cors) => gated.layer(cors),
        None => gated,
    };

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/initialize", get(system::initialize))
        .route("/auth/login", post(auth::login))
        // Per-user permission gate
        .merge(gated)
        // Shared-secret ingest
        .merge(ingest_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let users = Collection::Users;

    Router::new()
        .route(
            "/users",
            with_auth(get(users::list), state, users, Action::Read)
                .merge(with_auth(post(users::create), state, users, Action::Write)),
        )
        .route(
            "/users/:id",
            with_auth(get(users::get), state, users, Action::Read)
                .merge(with_auth(delete(users::delete), state, users, Action::Write)),
        )
        .route(
            "/users/:id/permissions",
            with_auth(put(users::replace_permissions), state, users, Action::Write),
        )
}

fn schema_routes(state: &AppState) -> Router<AppState> {
    let schemas = Collection::Schemas;

    Router::new()
        .route(
            "/schemas",
            with_auth(get(schemas::list), state, schemas, Action::Read)
                .merge(with_auth(post(schemas::create), state, schemas, Action::Write)),
        )
        .route(
            "/schemas/:id",
            with_auth(get(schemas::get), state, schemas, Action::Read).merge(with_auth(
                put(schemas::update).delete(schemas::delete),
                state,
                schemas,
                Action::Write,
            )),
        )
}

fn entry_routes(state: &AppState) -> Router<AppState> {
    let entries = Collection::Entries;

    Router::new()
        .route(
            "/entries",
            with_auth(get(entries::list), state, entries, Action::Read)
                .merge(with_auth(post(entries::create), state, entries, Action::Write)),
        )
        .route(
            "/entries/:id",
            with_auth(get(entries::get), state, entries, Action::Read).merge(with_auth(
                put(entries::update).delete(entries::delete),
                state,
                entries,
                Action::Write,
            )),
        )
}

/// Field clients post from arbitrary origins.
fn ingest_routes() -> Router<AppState> {
    Router::new()
        .route("/entries/bulk", post(ingest::bulk))
        .layer(CorsLayer::permissive())
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("username"),
                HeaderName::from_static("password"),
            ]),
    )
}
