//! Common test utilities
//!
//! Wires a connection registry to the mock engine and drives JSON-RPC
//! round-trips over an in-memory duplex transport, the way the real serving
//! loops drive a socket.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use drover::config::Config;
use drover::engine::MockEngine;
use drover::rpc::drive_connection;
use drover::server::{Connection, ConnectionRegistry};

/// Build a registry backed by a mock engine
pub fn test_registry() -> (Arc<ConnectionRegistry>, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    let registry = Arc::new(ConnectionRegistry::new(
        Config::default(),
        Arc::clone(&engine) as _,
    ));
    (registry, engine)
}

/// Client end of one in-memory connection
pub struct TestClient {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    next_id: i64,
}

/// Register a connection and drive it over an in-memory duplex stream
///
/// Returns the client end, the registered connection, and the task running
/// the connection loop. Dropping the client closes the transport, like a
/// peer disconnecting.
pub async fn connect(
    registry: &Arc<ConnectionRegistry>,
) -> (TestClient, Arc<Connection>, JoinHandle<()>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);

    let (connection, notifications) = registry.create().await;
    let driven = Arc::clone(&connection);
    let task = tokio::spawn(async move {
        drive_connection(server_read, server_write, driven, notifications).await;
    });

    let (client_read, client_write) = tokio::io::split(client_io);
    let client = TestClient {
        reader: BufReader::new(client_read),
        writer: client_write,
        next_id: 0,
    };

    (client, connection, task)
}

impl TestClient {
    /// Write one raw line to the server
    pub async fn send_raw(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("transport write failed");
    }

    /// Read the next message the server sends, response or notification
    pub async fn next_message(&mut self) -> Value {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .expect("transport read failed");
        assert!(read > 0, "server closed the transport");
        serde_json::from_str(&line).expect("server sent malformed JSON")
    }

    /// Send a request and await its response, skipping interleaved
    /// notifications
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id;

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        self.send_raw(&request.to_string()).await;

        loop {
            let message = self.next_message().await;
            if message["id"] == json!(id) {
                return message;
            }
        }
    }

    /// Call one operation and return the raw response
    pub async fn call(&mut self, name: &str, arguments: Value) -> Value {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    /// Read messages until a notification with the given method arrives
    pub async fn wait_for_notification(&mut self, method: &str) -> Value {
        loop {
            let message = self.next_message().await;
            if message["method"] == json!(method) {
                return message;
            }
        }
    }
}

/// The concatenated text blocks of a tools/call result
pub fn envelope_text(response: &Value) -> String {
    response["result"]["content"]
        .as_array()
        .expect("result has no content array")
        .iter()
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
