//! # Session Management Module
//!
//! Maps stable session identifiers to live engine handles on behalf of a
//! single connection.
//!
//! ## Functionality
//!
//! - **Lazy creation**: a session comes into existence the first time its
//!   identifier is acquired
//! - **Health-checked reuse**: cached handles are probed before every reuse
//! - **Transparent healing**: a handle whose probe fails with a recognized
//!   dead-session signature is discarded and recreated under the same
//!   identifier
//! - **Explicit disposal**: sessions can be released one at a time or all at
//!   once, with failures isolated per session
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use drover::engine::{MockEngine, SessionOptions};
//! use drover::session::{SessionRegistry, DEFAULT_SESSION_ID};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SessionRegistry::new(Arc::new(MockEngine::new()));
//!
//! let session = registry
//!     .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
//!     .await?;
//! println!("live session: {}", session.id());
//!
//! registry.release(DEFAULT_SESSION_ID).await;
//! # Ok(())
//! # }
//! ```

pub mod registry;

#[cfg(test)]
pub mod tests;

pub use registry::{Session, SessionRegistry, DEFAULT_SESSION_ID};
