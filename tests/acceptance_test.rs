//! JSON-RPC acceptance tests
//!
//! Full round-trips through the connection loop: handshake, catalog listing,
//! operation dispatch, failure normalization, the screenshot resource flow,
//! and transport-close cleanup.

mod common;

use serde_json::json;

use common::{connect, envelope_text, test_registry};

#[tokio::test]
async fn test_initialize_reports_server_identity() {
    let (registry, _engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    let response = client.request("initialize", json!({})).await;

    assert_eq!(response["result"]["serverInfo"]["name"], "drover");
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn test_tools_list_exposes_full_catalog() {
    let (registry, engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    let response = client.request("tools/list", json!({})).await;

    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 8);
    let names: Vec<&str> = tools
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"navigate"));
    assert!(names.contains(&"agent"));
    assert!(names.contains(&"create_session"));

    // Listing the catalog never touches a session.
    assert_eq!(engine.created_handles(), 0);
}

#[tokio::test]
async fn test_navigate_round_trip_creates_default_session() {
    let (registry, engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    let response = client
        .call("navigate", json!({"url": "https://example.com"}))
        .await;

    assert_eq!(response["result"]["isError"], false);
    assert!(envelope_text(&response).contains("Navigated to: https://example.com"));

    assert_eq!(engine.created_handles(), 1);
    let page = engine.last_handle().await.unwrap().mock_page();
    assert_eq!(page.navigations().await, vec!["https://example.com"]);
}

#[tokio::test]
async fn test_unknown_operation_is_fault_and_touches_nothing() {
    let (registry, engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    let response = client.call("frobnicate", json!({})).await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(engine.created_handles(), 0);
}

#[tokio::test]
async fn test_engine_failure_is_error_envelope_not_fault() {
    let (registry, engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    client.call("create_session", json!({})).await;
    engine
        .last_handle()
        .await
        .unwrap()
        .mock_page()
        .set_act_error("boom")
        .await;

    let response = client.call("act", json!({"action": "click"})).await;

    assert!(response["error"].is_null());
    assert_eq!(response["result"]["isError"], true);
    assert!(envelope_text(&response).contains("boom"));
}

#[tokio::test]
async fn test_screenshot_resource_flow() {
    let (registry, _engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    let response = client.call("screenshot", json!({})).await;
    assert_eq!(response["result"]["isError"], false);

    client
        .wait_for_notification("notifications/resources/list_changed")
        .await;

    let listed = client.request("resources/list", json!({})).await;
    let resources = listed["result"]["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    let uri = resources[0]["uri"].as_str().unwrap().to_string();
    assert!(uri.starts_with("screenshot://"));

    let read = client.request("resources/read", json!({"uri": uri})).await;
    let contents = &read["result"]["contents"][0];
    assert_eq!(contents["mimeType"], "image/png");
    assert!(!contents["blob"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_reading_missing_resource_is_fault() {
    let (registry, _engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    let response = client
        .request("resources/read", json!({"uri": "screenshot://nope"}))
        .await;

    assert_eq!(response["error"]["code"], -32002);
}

#[tokio::test]
async fn test_malformed_line_gets_parse_error() {
    let (registry, _engine) = test_registry();
    let (mut client, _connection, _task) = connect(&registry).await;

    client.send_raw("this is not json").await;

    let response = client.next_message().await;
    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn test_sessions_are_partitioned_per_connection() {
    let (registry, engine) = test_registry();
    let (mut first, _conn_a, _task_a) = connect(&registry).await;
    let (mut second, _conn_b, _task_b) = connect(&registry).await;

    first
        .call("navigate", json!({"url": "https://a.example"}))
        .await;
    second
        .call("navigate", json!({"url": "https://b.example"}))
        .await;

    // Each connection lazily created its own default session.
    assert_eq!(engine.created_handles(), 2);
    let handles = engine.handles().await;
    assert_eq!(
        handles[0].mock_page().navigations().await,
        vec!["https://a.example"]
    );
    assert_eq!(
        handles[1].mock_page().navigations().await,
        vec!["https://b.example"]
    );
}

#[tokio::test]
async fn test_transport_eof_disposes_connection_sessions() {
    let (registry, engine) = test_registry();
    let (mut client, connection, task) = connect(&registry).await;

    client
        .call("navigate", json!({"url": "https://example.com"}))
        .await;
    let handle = engine.last_handle().await.unwrap();
    assert!(!handle.is_closed());

    // Peer disconnect: the connection loop ends, then the serving loop
    // deregisters the entry, which disposes its sessions.
    drop(client);
    task.await.unwrap();
    registry.remove(connection.id()).await;

    assert!(handle.is_closed());
    assert!(registry.is_empty().await);
}
