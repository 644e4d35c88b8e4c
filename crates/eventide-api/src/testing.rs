//! Request helpers shared by the route tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eventide_runtime::{EventRuntime, RuntimeConfig, RuntimeServices};
use eventide_test_support::InMemorySaveRepository;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::state::AppState;

/// State over a headless runtime and an in-memory save repository.
pub fn test_state() -> AppState {
    let runtime = EventRuntime::new(RuntimeConfig::default(), RuntimeServices::headless());
    AppState::new(runtime, Arc::new(InMemorySaveRepository::new()))
}

/// Sends a request and decodes the JSON response body.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    content_type: &str,
    body: String,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Sends a JSON request.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, method, uri, "application/json", body.to_string()).await
}

/// Sends a POST request with no body.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, "application/json", String::new()).await
}

/// Sends a GET request.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, "application/json", String::new()).await
}
