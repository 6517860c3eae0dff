//! Automation engine layer traits
//!
//! This module defines the abstract interface to the external automation
//! engine. The engine owns the real browser state and the planning logic;
//! this layer only ever sees opaque handles that succeed with a value or
//! fail with an error carrying a message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Expression evaluated by the liveness probe
pub const PROBE_EXPRESSION: &str = "document.title";

/// Options for creating (or resuming) an engine session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Engine-side session identifier to resume, if any
    pub resume_id: Option<String>,
    /// Model driving act/observe/extract
    pub model: String,
    /// DOM settle timeout in milliseconds
    pub settle_timeout_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            resume_id: None,
            model: String::new(),
            settle_timeout_ms: 30_000,
        }
    }
}

/// Options for an autonomous agent task
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Model driving the agent loop
    pub model: String,
    /// Upper bound on agent steps
    pub max_steps: u32,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_steps: 20,
        }
    }
}

/// Load state to await after navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// DOM content loaded
    DomContentLoaded,
    /// Full load event
    Load,
    /// Network went idle
    NetworkIdle,
}

impl LoadState {
    /// Wire name of the load state
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::Load => "load",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

/// Outcome of a performed action
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Engine-reported description of what was done
    pub message: String,
}

/// One candidate element/action suggestion from an observe call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Selector locating the element
    pub selector: String,
    /// Human-readable description
    pub description: String,
    /// Suggested interaction method, when requested
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method: Option<String>,
}

/// Outcome of an autonomous agent task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// Whether the task completed successfully
    pub success: bool,
    /// Engine-reported summary message
    pub message: String,
    /// Log of actions the agent took
    #[serde(default)]
    pub actions: Vec<Value>,
}

/// Automation engine trait
///
/// Factory for live engine session handles. Sessions are expensive remote
/// resources; callers create them lazily and must close them explicitly.
#[async_trait]
pub trait AutomationEngine: Send + Sync + std::fmt::Debug {
    /// Create a live session handle
    async fn create_handle(
        &self,
        options: SessionOptions,
    ) -> Result<Arc<dyn EngineHandle>, crate::Error>;
}

/// One live engine session
#[async_trait]
pub trait EngineHandle: Send + Sync + std::fmt::Debug {
    /// Engine-side session identifier
    fn id(&self) -> &str;

    /// Live debug URL for watching the session, when the engine exposes one
    fn debug_url(&self) -> Option<String>;

    /// Cheap liveness probe; fails when the session has died
    async fn probe(&self) -> Result<(), crate::Error>;

    /// The session's active page
    fn page(&self) -> Arc<dyn PageHandle>;

    /// Browser-level view of the session
    fn browser(&self) -> Arc<dyn BrowserHandle>;

    /// Run an autonomous agent task against the session
    async fn execute_agent(
        &self,
        options: AgentOptions,
        instruction: &str,
    ) -> Result<AgentOutcome, crate::Error>;

    /// Close the session and release the remote browser
    async fn close(&self) -> Result<(), crate::Error>;
}

/// Page-level operations on a live session
#[async_trait]
pub trait PageHandle: Send + Sync + std::fmt::Debug {
    /// Navigate to a URL and await the given load state
    async fn goto(&self, url: &str, wait_until: LoadState) -> Result<(), crate::Error>;

    /// Perform a natural-language action against the page
    async fn act(&self, action: &str) -> Result<ActionOutcome, crate::Error>;

    /// Observe candidate elements/actions for an instruction
    async fn observe(
        &self,
        instruction: &str,
        return_action: bool,
    ) -> Result<Vec<Observation>, crate::Error>;

    /// Extract structured data guided by an instruction
    async fn extract(
        &self,
        instruction: &str,
        schema: Option<Value>,
    ) -> Result<Value, crate::Error>;

    /// Evaluate a JavaScript expression in the page
    async fn evaluate(&self, expression: &str) -> Result<Value, crate::Error>;

    /// Capture a PNG screenshot of the viewport (or the full page)
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, crate::Error>;

    /// Wait for the DOM and network to settle
    async fn wait_for_settle(&self) -> Result<(), crate::Error>;
}

/// Browser-level view of a live session
pub trait BrowserHandle: Send + Sync + std::fmt::Debug {
    /// Whether the remote browser connection is still up
    fn is_connected(&self) -> bool;
}
