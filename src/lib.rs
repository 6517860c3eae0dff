//! Drover: browser-automation gateway server
//!
//! This library exposes browser-automation operations (navigate, act,
//! observe, extract, screenshot, autonomous agent tasks) over JSON-RPC,
//! multiplexed across concurrent connections and concurrently-open engine
//! sessions. The automation engine itself is an external collaborator; this
//! crate owns the session-and-connection lifecycle around it.

pub mod error;
pub mod config;

pub mod engine;
pub mod session;
pub mod server;
pub mod ops;
pub mod rpc;
pub mod resources;

// Re-exports
pub use error::{Error, Result};

/// Drover library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
