//! Line-delimited JSON-RPC transports
//!
//! Two bindings share one connection loop: stdio (the singleton connection)
//! and TCP (one connection per accepted socket). Each connection reads
//! requests line by line, dispatches them against its automation context,
//! and writes responses and server-initiated notifications through a single
//! writer task.

use std::net::SocketAddr;

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::ops;
use crate::rpc::codec::{self, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::server::{AutomationContext, Connection, ConnectionRegistry, ExitWatchdog, ShutdownState};
use crate::Result;

/// Serve the singleton stdio connection until stdin closes
///
/// EOF on stdin is a first-class shutdown trigger: once the connection ends,
/// the watchdog drains the whole process.
pub async fn serve_stdio(
    registry: Arc<ConnectionRegistry>,
    watchdog: Arc<ExitWatchdog>,
) -> Result<()> {
    info!("Serving on stdio");

    let (connection, notifications) = registry.create().await;
    let id = connection.id();

    drive_connection(
        tokio::io::stdin(),
        tokio::io::stdout(),
        connection,
        notifications,
    )
    .await;

    registry.remove(id).await;
    watchdog.drain().await;
    Ok(())
}

/// Accept TCP connections until the watchdog leaves `Running`
pub async fn serve_tcp(
    addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    watchdog: Arc<ExitWatchdog>,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening for connections");

    let mut lifecycle = watchdog.subscribe();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        info!(peer = %peer, "Accepted connection");
                        let registry = Arc::clone(&registry);
                        tokio::spawn(async move {
                            let (connection, notifications) = registry.create().await;
                            let id = connection.id();
                            let (read_half, write_half) = socket.into_split();
                            drive_connection(read_half, write_half, connection, notifications)
                                .await;
                            registry.remove(id).await;
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                    }
                }
            }
            changed = lifecycle.changed() => {
                if changed.is_err() || *lifecycle.borrow() != ShutdownState::Running {
                    info!("Stopping listener");
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Run one connection's read/dispatch/write loop until the transport ends or
/// the connection is closed server-side
pub async fn drive_connection<R, W>(
    reader: R,
    writer: W,
    connection: Arc<Connection>,
    notifications: mpsc::UnboundedReceiver<JsonRpcNotification>,
) where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_loop(writer, out_rx));
    let notify_task = tokio::spawn(forward_notifications(notifications, out_tx.clone()));

    let mut lines = BufReader::new(reader).lines();
    let mut shutdown = connection.shutdown_signal();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let Some(response) = handle_line(connection.context(), line).await else {
                            continue;
                        };
                        match serde_json::to_string(&response) {
                            Ok(serialized) => {
                                if out_tx.send(serialized).is_err() {
                                    break;
                                }
                            }
                            Err(e) => error!(error = %e, "Failed to serialize response"),
                        }
                    }
                    Ok(None) => {
                        debug!(connection_id = connection.id(), "Transport reached EOF");
                        break;
                    }
                    Err(e) => {
                        warn!(connection_id = connection.id(), error = %e, "Transport read failed");
                        break;
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(connection_id = connection.id(), "Connection closed by server");
                    break;
                }
            }
        }
    }

    drop(out_tx);
    notify_task.abort();
    let _ = writer_task.await;
}

async fn write_loop<W: AsyncWrite + Unpin>(writer: W, mut rx: mpsc::UnboundedReceiver<String>) {
    let mut writer = BufWriter::new(writer);

    while let Some(line) = rx.recv().await {
        if let Err(e) = write_line(&mut writer, &line).await {
            debug!(error = %e, "Transport write failed");
            break;
        }
    }

    let _ = writer.shutdown().await;
}

async fn write_line<W: AsyncWrite + Unpin>(
    writer: &mut BufWriter<W>,
    line: &str,
) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

async fn forward_notifications(
    mut notifications: mpsc::UnboundedReceiver<JsonRpcNotification>,
    out: mpsc::UnboundedSender<String>,
) {
    while let Some(notification) = notifications.recv().await {
        match serde_json::to_string(&notification) {
            Ok(line) => {
                if out.send(line).is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "Dropping unserializable notification"),
        }
    }
}

/// Parse and dispatch one inbound line; `None` when no response is owed
async fn handle_line(context: &AutomationContext, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return Some(codec::parse_error(e.to_string())),
    };

    let Some(id) = request.id.clone() else {
        handle_notification(&request);
        return None;
    };

    Some(dispatch_request(context, request, id).await)
}

fn handle_notification(request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => debug!("Client finished initializing"),
        other => debug!(method = %other, "Ignoring notification"),
    }
}

async fn dispatch_request(
    context: &AutomationContext,
    request: JsonRpcRequest,
    id: Value,
) -> JsonRpcResponse {
    match request.method.as_str() {
        "initialize" => initialize_response(id),
        "ping" => JsonRpcResponse::result(id, json!({})),
        "tools/list" => tools_list(id),
        "tools/call" => tools_call(context, id, request.params).await,
        "resources/list" => resources_list(context, id),
        "resources/read" => resources_read(context, id, request.params),
        other => codec::method_not_found(Some(id), other),
    }
}

fn initialize_response(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::result(
        id,
        json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": {
                "name": "drover",
                "version": crate::VERSION,
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": true },
            },
        }),
    )
}

fn tools_list(id: Value) -> JsonRpcResponse {
    let tools: Vec<Value> = ops::NAMES
        .iter()
        .filter_map(|name| {
            ops::lookup(name).map(|spec| {
                json!({
                    "name": name,
                    "description": spec.description,
                    "inputSchema": (spec.schema)(),
                })
            })
        })
        .collect();

    JsonRpcResponse::result(id, json!({ "tools": tools }))
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn tools_call(context: &AutomationContext, id: Value, params: Option<Value>) -> JsonRpcResponse {
    let params: ToolCallParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
        Ok(params) => params,
        Err(e) => return codec::invalid_params(Some(id), e.to_string()),
    };

    match context.run(&params.name, params.arguments).await {
        Ok(envelope) => match serde_json::to_value(&envelope) {
            Ok(result) => JsonRpcResponse::result(id, result),
            Err(e) => codec::internal_error(Some(id), e.to_string()),
        },
        Err(e) => JsonRpcResponse::fault(Some(id), e.into()),
    }
}

fn resources_list(context: &AutomationContext, id: Value) -> JsonRpcResponse {
    match context.screenshots().list() {
        Ok(resources) => match serde_json::to_value(&resources) {
            Ok(rows) => JsonRpcResponse::result(id, json!({ "resources": rows })),
            Err(e) => codec::internal_error(Some(id), e.to_string()),
        },
        Err(e) => JsonRpcResponse::fault(Some(id), e.into()),
    }
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

fn resources_read(context: &AutomationContext, id: Value, params: Option<Value>) -> JsonRpcResponse {
    let params: ResourceReadParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
        Ok(params) => params,
        Err(e) => return codec::invalid_params(Some(id), e.to_string()),
    };

    match context.screenshots().read(&params.uri) {
        Ok(contents) => match serde_json::to_value(&contents) {
            Ok(row) => JsonRpcResponse::result(id, json!({ "contents": [row] })),
            Err(e) => codec::internal_error(Some(id), e.to_string()),
        },
        Err(e) => JsonRpcResponse::fault(Some(id), e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::MockEngine;
    use crate::resources::ScreenshotStore;

    fn test_context() -> AutomationContext {
        let (notify_tx, _notify_rx) = mpsc::unbounded_channel();
        AutomationContext::new(
            Config::default(),
            Arc::new(MockEngine::new()),
            Arc::new(ScreenshotStore::new()),
            notify_tx,
        )
    }

    fn fault_code(response: JsonRpcResponse) -> i64 {
        match response {
            JsonRpcResponse::Error(response) => response.error.code,
            JsonRpcResponse::Result(_) => panic!("expected an error response"),
        }
    }

    #[tokio::test]
    async fn test_malformed_line_is_parse_error() {
        let context = test_context();
        let response = handle_line(&context, "this is not json").await.unwrap();
        assert_eq!(fault_code(response), codec::codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let context = test_context();
        let response = handle_line(&context, r#"{"jsonrpc":"2.0","id":1,"method":"prompts/list"}"#)
            .await
            .unwrap();
        assert_eq!(fault_code(response), codec::codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_inbound_notification_gets_no_response() {
        let context = test_context();
        let response = handle_line(
            &context,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_ping_returns_empty_result() {
        let context = test_context();
        let response = handle_line(&context, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await
            .unwrap();
        match response {
            JsonRpcResponse::Result(result) => assert_eq!(result.result, json!({})),
            JsonRpcResponse::Error(_) => panic!("expected a result"),
        }
    }

    #[tokio::test]
    async fn test_tools_list_is_in_catalog_order() {
        let context = test_context();
        let response = handle_line(&context, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await
            .unwrap();
        let JsonRpcResponse::Result(result) = response else {
            panic!("expected a result");
        };

        let names: Vec<&str> = result.result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ops::NAMES);
    }

    #[tokio::test]
    async fn test_unknown_operation_is_invalid_params_fault() {
        let context = test_context();
        let response = handle_line(
            &context,
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"frobnicate"}}"#,
        )
        .await
        .unwrap();
        assert_eq!(fault_code(response), codec::codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_missing_resource_is_resource_not_found_fault() {
        let context = test_context();
        let response = handle_line(
            &context,
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/read","params":{"uri":"screenshot://nope"}}"#,
        )
        .await
        .unwrap();
        assert_eq!(fault_code(response), codec::codes::RESOURCE_NOT_FOUND);
    }
}
