//! # RPC Transport Module
//!
//! Line-delimited JSON-RPC 2.0 binding for the operation surface.
//!
//! ## Functionality
//!
//! - **Codec**: request/response/notification message types and wire fault
//!   codes
//! - **Serving loops**: a singleton stdio binding and a multi-connection TCP
//!   binding, both driving the same per-connection read/dispatch/write loop
//! - **Method surface**: `initialize`, `ping`, `tools/list`, `tools/call`,
//!   `resources/list`, `resources/read`; anything else is method-not-found
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use drover::config::Config;
//! use drover::engine::MockEngine;
//! use drover::rpc::serve_tcp;
//! use drover::server::{ConnectionRegistry, ExitWatchdog};
//!
//! # async fn example() -> drover::Result<()> {
//! let config = Config::default();
//! let addr = config.listen_addr()?;
//! let registry = Arc::new(ConnectionRegistry::new(config, Arc::new(MockEngine::new())));
//! let watchdog = Arc::new(ExitWatchdog::new(Arc::clone(&registry), Duration::from_secs(15)));
//!
//! serve_tcp(addr, registry, watchdog).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod server;

pub use codec::{
    codes, JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, JsonRpcResult, JSONRPC_VERSION,
};
pub use server::{drive_connection, serve_stdio, serve_tcp};
