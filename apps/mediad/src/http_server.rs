//! The HTTP/JSON REST front end (spec.md §4.7): GET/POST/PUT/DELETE map onto
//! the same `read`/`create`/`update`/`delete` verbs the TCP server reaches
//! through the Parser, `/health`, `/version`, and `/pipelines/status`
//! bypass the Parser and the worker pool entirely, and every other request
//! is handed off through the bounded worker pool. Routing and middleware
//! shape is modeled on `streamkit-server`'s `server.rs`; the CORS headers
//! here are the fixed wildcard spec.md §4.7 mandates, not the teacher's
//! configurable origin allowlist.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mediad_core::{CoreError, CoreResult};
use mediad_parser::Command;
use serde_json::Value;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{warn, Level};

use crate::envelope::{render_envelope, return_code_of};
use crate::state::AppState;

#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::RANGE, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/pipelines/status", get(pipelines_status_handler))
        .fallback(generic_handler)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                    .on_failure(DefaultOnFailure::new().level(Level::WARN)),
            ),
        )
        .layer(cors)
        .with_state(state)
}

/// Bypasses the Engine entirely (spec.md §4.7 "fast paths").
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "code": 0,
        "description": "OK",
        "response": {"status": "healthy"},
    }))
}

/// SPEC_FULL.md's added fast path.
async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "code": 0,
        "description": "OK",
        "response": {"name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION")},
    }))
}

/// Holds the Pipelines container's read lock for one listing pass instead
/// of resolving and reading every pipeline through the Parser (§4.7).
async fn pipelines_status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let listing = state.session.pipelines().status_listing().await;
    let response = serde_json::json!({
        "pipelines": listing
            .iter()
            .map(|(name, status)| serde_json::json!({"name": name, "state": status}))
            .collect::<Vec<_>>(),
        "count": listing.len(),
    });
    Json(render_envelope(Ok(response)))
}

/// Every route not served by a fast path: resolves the method/path/body
/// into a [`Command`] and hands it off to the worker pool.
async fn generic_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let is_json_body = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    let command = match build_command(&method, &path, is_json_body, &body, &query) {
        Ok(command) => command,
        Err(err) => return envelope_response(Err(err)),
    };

    let root = state.root.clone();
    let (tx, rx) = oneshot::channel();
    let submitted = state.http_pool.try_submit(async move {
        let result = mediad_parser::execute(&root, command).await;
        let _ = tx.send(result);
    });

    if submitted.is_err() {
        warn!(path = %path, "HTTP worker pool at capacity, rejecting request");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(render_envelope(Err(CoreError::NoConnection("worker pool at capacity".to_string())))),
        )
            .into_response();
    }

    match rx.await {
        Ok(result) => envelope_response(result),
        Err(_) => envelope_response(Err(CoreError::BadCommand("worker task was dropped".to_string()))),
    }
}

/// Extracts `name`/`description` from a JSON body (preferred) or the query
/// string (fallback), per §4.7's body-parsing rule, and maps the method
/// onto the matching verb's [`Command`].
fn build_command(
    method: &Method,
    path: &str,
    is_json_body: bool,
    body: &[u8],
    query: &HashMap<String, String>,
) -> Result<Command, CoreError> {
    let body_fields: HashMap<String, String> = if is_json_body && !body.is_empty() {
        serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| value.as_object().cloned())
            .map(|obj| obj.into_iter().filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string()))).collect())
            .unwrap_or_default()
    } else {
        HashMap::new()
    };

    let field = |key: &str| body_fields.get(key).or_else(|| query.get(key)).cloned();

    match *method {
        Method::GET => Ok(Command::Read { path: path.to_string() }),
        Method::POST => {
            let name = field("name").ok_or_else(|| CoreError::BadValue(path.to_string(), "missing name".to_string()))?;
            let description = field("description").unwrap_or_default();
            Ok(Command::Create { path: path.to_string(), name, description })
        },
        Method::PUT => {
            let value = field("name").ok_or_else(|| CoreError::BadValue(path.to_string(), "missing name".to_string()))?;
            Ok(Command::Update { path: path.to_string(), value })
        },
        Method::DELETE => {
            let name = field("name").ok_or_else(|| CoreError::BadValue(path.to_string(), "missing name".to_string()))?;
            Ok(Command::Delete { path: path.to_string(), name })
        },
        other => Err(CoreError::BadCommand(format!("unsupported HTTP method {other}"))),
    }
}

fn envelope_response(result: CoreResult<Value>) -> Response {
    let status = StatusCode::from_u16(return_code_of(&result).http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(render_envelope(result))).into_response()
}
