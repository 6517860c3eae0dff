//! Engine layer tests
//!
//! Mock bookkeeping tests plus HTTP client tests against a local wiremock
//! server standing in for the engine daemon.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::mock::MockEngine;
use super::traits::*;
use crate::engine::http::HttpEngine;
use crate::Error;

fn engine_for(server: &MockServer) -> HttpEngine {
    HttpEngine::new(&server.uri(), "test-key", "test-project").unwrap()
}

#[tokio::test]
async fn test_mock_engine_counts_handles() {
    let engine = MockEngine::new();
    assert_eq!(engine.created_handles(), 0);

    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();

    assert_eq!(engine.created_handles(), 1);
    assert_eq!(handle.id(), "mock-session-1");
    assert!(handle.browser().is_connected());
}

#[tokio::test]
async fn test_mock_engine_resume_id_becomes_handle_id() {
    let engine = MockEngine::new();
    let options = SessionOptions {
        resume_id: Some("resumed".to_string()),
        ..SessionOptions::default()
    };

    let handle = engine.create_handle(options).await.unwrap();
    assert_eq!(handle.id(), "resumed");
}

#[tokio::test]
async fn test_mock_probe_scripting() {
    let engine = MockEngine::new();
    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();
    let mock = engine.last_handle().await.unwrap();

    assert!(handle.probe().await.is_ok());

    mock.set_probe_error("Session expired").await;
    let err = handle.probe().await.unwrap_err();
    assert!(err.is_session_terminated());
    assert_eq!(mock.probe_count(), 2);
}

#[tokio::test]
async fn test_mock_close_marks_browser_disconnected() {
    let engine = MockEngine::new();
    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();

    let browser = handle.browser();
    assert!(browser.is_connected());

    handle.close().await.unwrap();
    assert!(!browser.is_connected());
}

#[tokio::test]
async fn test_http_create_handle_posts_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .and(header("x-api-key", "test-key"))
        .and(header("x-project-id", "test-project"))
        .and(body_partial_json(json!({ "model": "m1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s-42",
            "debug_url": "https://engine.local/sessions/s-42",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let options = SessionOptions {
        model: "m1".to_string(),
        ..SessionOptions::default()
    };

    let handle = engine.create_handle(options).await.unwrap();
    assert_eq!(handle.id(), "s-42");
    assert_eq!(
        handle.debug_url().as_deref(),
        Some("https://engine.local/sessions/s-42")
    );
}

#[tokio::test]
async fn test_http_error_body_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions/s-1/act"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Session expired" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s-1" })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();

    let err = handle.page().act("click the button").await.unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
    assert!(err.is_session_terminated());
    assert!(err.to_string().contains("Session expired"));
}

#[tokio::test]
async fn test_http_probe_routes_through_evaluate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s-2" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s-2/evaluate"))
        .and(body_partial_json(json!({ "expression": PROBE_EXPRESSION })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "Title" })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();

    handle.probe().await.unwrap();
}

#[tokio::test]
async fn test_http_screenshot_decodes_base64() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s-3" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s-3/screenshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "aGVsbG8=" })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();

    let bytes = handle.page().screenshot(false).await.unwrap();
    assert_eq!(bytes, b"hello");
}

#[tokio::test]
async fn test_http_close_deletes_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s-4" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/sessions/s-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let handle = engine
        .create_handle(SessionOptions::default())
        .await
        .unwrap();

    let browser = handle.browser();
    handle.close().await.unwrap();
    assert!(!browser.is_connected());
}
