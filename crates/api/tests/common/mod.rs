#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use caseload_api::config::ServerConfig;
use caseload_api::router::build_app_router;
use caseload_api::state::AppState;
use caseload_services::{ServiceContext, Services};
use caseload_store::{Store, StoreConfig};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same builder as `main.rs`, so tests exercise the production
/// middleware stack.
pub async fn build_test_app() -> Router {
    let store = Store::open(&StoreConfig::memory()).await.unwrap();
    let state = AppState {
        services: Arc::new(Services::new(ServiceContext::with_defaults(store.clone()))),
        store,
        config: Arc::new(test_config()),
    };
    build_app_router(state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Invoke a tool and return the status code and parsed body.
pub async fn call(app: &Router, tool: &str, args: Value) -> (axum::http::StatusCode, Value) {
    let response = post_raw(app.clone(), &format!("/api/v1/tools/{tool}"), args.to_string()).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
