//! # Server Lifecycle Module
//!
//! The per-connection and process-wide lifecycle layer: automation contexts,
//! the connection registry, and the shutdown watchdog.
//!
//! ## Functionality
//!
//! - **Automation context**: one per connection; owns its sessions, tracks
//!   the current one, and dispatches operation calls
//! - **Connection registry**: process-wide bookkeeping of live connections,
//!   with concurrent bulk close for shutdown
//! - **Exit watchdog**: `Running -> Draining -> Terminated` state machine
//!   racing graceful close against a bounded grace timer
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use drover::config::Config;
//! use drover::engine::MockEngine;
//! use drover::server::{ConnectionRegistry, ExitWatchdog};
//!
//! # async fn example() {
//! let registry = Arc::new(ConnectionRegistry::new(
//!     Config::default(),
//!     Arc::new(MockEngine::new()),
//! ));
//! let watchdog = ExitWatchdog::new(Arc::clone(&registry), Duration::from_secs(15));
//!
//! let (connection, _notifications) = registry.create().await;
//! let envelope = connection
//!     .context()
//!     .run("navigate", serde_json::json!({"url": "https://example.com"}))
//!     .await
//!     .unwrap();
//! assert!(!envelope.is_error);
//!
//! watchdog.drain().await;
//! # }
//! ```

pub mod context;
pub mod registry;
pub mod watchdog;


pub use context::AutomationContext;
pub use registry::{Connection, ConnectionRegistry};
pub use watchdog::{ExitWatchdog, ShutdownState};
