//! # Automation engine layer
//!
//! Client-side boundary to the external automation engine that owns the real
//! browser state. Everything above this layer treats engine sessions as opaque
//! handles: they are created, probed, driven and closed, and every call either
//! succeeds with a value or fails with an error carrying a message.
//!
//! ## Main functionality
//! - **Session handles**: create, resume, probe and close remote engine sessions
//! - **Page operations**: navigate, act, observe, extract, evaluate, screenshot
//! - **Agent tasks**: run autonomous multi-step instructions
//! - **Settle waiting**: DOM/network quiescence after state-changing calls
//!
//! ## Module structure
//! - `traits`: core trait definitions for the engine boundary
//! - `http`: HTTP/JSON client for a remote engine daemon
//! - `mock`: scriptable implementations for testing
//!
//! ## Usage
//! ```rust,no_run
//! use drover::engine::{
//!     AutomationEngine, EngineHandle, HttpEngine, LoadState, PageHandle, SessionOptions,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = HttpEngine::new("http://127.0.0.1:7317", "api-key", "project")?;
//! let handle = engine.create_handle(SessionOptions::default()).await?;
//!
//! handle
//!     .page()
//!     .goto("https://example.com", LoadState::DomContentLoaded)
//!     .await?;
//! handle.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod http;
pub mod mock;

#[cfg(test)]
pub mod tests;

pub use traits::{
    ActionOutcome, AgentOptions, AgentOutcome, AutomationEngine, BrowserHandle, EngineHandle,
    LoadState, Observation, PageHandle, SessionOptions, PROBE_EXPRESSION,
};

// Re-export implementation structs
pub use http::{HttpEngine, HttpEngineHandle, HttpPage};

// Re-export mock for development/testing
pub use mock::{MockEngine, MockHandle, MockPage};
