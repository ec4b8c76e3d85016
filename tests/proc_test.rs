//! Tests for the statistics and service routes

mod common;

use axum::{body::Body, http::{header, Method, Request, StatusCode}};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{app, get, post, MemoryBackend};

#[tokio::test]
async fn test_counter_all_reflects_requests() {
    let test = app(MemoryBackend::new());

    post(&test.router, "/graph/last", json!([{"endpoint": "h1", "counter": "cpu.load"}])).await;
    post(&test.router, "/graph/last", json!([{"endpoint": "h1", "counter": "cpu.load"}])).await;

    let (status, body) = get(&test.router, "/counter/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["query_last_requests_total"], 2);
    assert_eq!(body["data"]["query_backend_failures_total"], 2);
    assert_eq!(body["data"]["query_history_requests_total"], 0);
}

#[tokio::test]
async fn test_prometheus_exposition() {
    let test = app(MemoryBackend::new());
    post(&test.router, "/graph/sdp/alive", json!([{"endpoint": "h1"}])).await;

    let (status, body) = get(&test.router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("query_alive_requests_total 1"));
    assert!(text.contains("query_request_duration_seconds_bucket"));
}

#[tokio::test]
async fn test_health_and_version() {
    let test = app(MemoryBackend::new());

    let (status, body) = get(&test.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));

    let (status, body) = get(&test.router, "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String(env!("CARGO_PKG_VERSION").to_string()));
}

#[tokio::test]
async fn test_cors_preflight() {
    let test = app(MemoryBackend::new());

    let response = test
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/graph/last")
                .header(header::ORIGIN, "http://dashboard.local")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
