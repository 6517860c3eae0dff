//! # Operation Catalog Module
//!
//! The static set of operations callable over the wire, each registered with
//! its description, input schema, classification, and side-effect flags.
//!
//! ## Functionality
//!
//! - **Catalog**: a fixed name-to-registration map resolved at compile time
//! - **Classification**: every operation is tagged `SessionScoped` (runs
//!   against the current session's page) or `SetScoped` (manages the session
//!   set itself)
//! - **Side-effect flags**: whether the dispatcher waits for the page to
//!   settle and/or stores a screenshot artifact after a successful run
//! - **Result envelope**: the uniform `{content, isError}` shape every
//!   operation resolves to
//!
//! ## Usage
//!
//! ```rust
//! use drover::ops::{lookup, ContentBlock, OperationKind, ResultEnvelope};
//!
//! let spec = lookup("navigate").unwrap();
//! assert_eq!(spec.kind, OperationKind::SessionScoped);
//! assert!(spec.snapshot_after);
//!
//! let envelope = ResultEnvelope::success(vec![ContentBlock::text("done")]);
//! assert!(!envelope.is_error);
//! ```

use futures::future::BoxFuture;
use phf::phf_map;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::server::AutomationContext;
use crate::{Error, Result};

pub mod act;
pub mod agent;
pub mod extract;
pub mod navigate;
pub mod observe;
pub mod screenshot;
pub mod session;


/// One typed block of operation output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        /// Base64-encoded image bytes
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentBlock {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image<D: Into<String>, M: Into<String>>(data: D, mime_type: M) -> Self {
        ContentBlock::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Uniform result shape for every dispatched operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ResultEnvelope {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: true,
        }
    }

    /// The concatenated text of every text block
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How an operation relates to the session set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Runs against the current session's page, creating the session on
    /// demand
    SessionScoped,
    /// Creates or closes sessions; never resolves a page
    SetScoped,
}

/// Handler signature shared by every operation
pub type OpHandler =
    for<'a> fn(&'a AutomationContext, Value) -> BoxFuture<'a, Result<Vec<ContentBlock>>>;

/// Registration record for one operation
pub struct OpSpec {
    pub description: &'static str,
    pub kind: OperationKind,
    /// Wait for the page to settle after a successful run
    pub settle_after: bool,
    /// Store a screenshot artifact after a successful run
    pub snapshot_after: bool,
    pub schema: fn() -> Value,
    pub handler: OpHandler,
}

/// Catalog order, as exposed by the operation-list request
pub const NAMES: &[&str] = &[
    "navigate",
    "act",
    "observe",
    "extract",
    "screenshot",
    "agent",
    "create_session",
    "close_session",
];

static CATALOG: phf::Map<&'static str, OpSpec> = phf_map! {
    "navigate" => OpSpec {
        description: "Navigate the current page to a URL",
        kind: OperationKind::SessionScoped,
        settle_after: false,
        snapshot_after: true,
        schema: navigate::schema,
        handler: run_navigate,
    },
    "act" => OpSpec {
        description: "Perform a natural-language action on the current page",
        kind: OperationKind::SessionScoped,
        settle_after: true,
        snapshot_after: true,
        schema: act::schema,
        handler: run_act,
    },
    "observe" => OpSpec {
        description: "Find candidate elements and actions for an instruction",
        kind: OperationKind::SessionScoped,
        settle_after: false,
        snapshot_after: false,
        schema: observe::schema,
        handler: run_observe,
    },
    "extract" => OpSpec {
        description: "Extract structured data or readable text from the current page",
        kind: OperationKind::SessionScoped,
        settle_after: false,
        snapshot_after: false,
        schema: extract::schema,
        handler: run_extract,
    },
    "screenshot" => OpSpec {
        description: "Capture a screenshot of the current viewport",
        kind: OperationKind::SessionScoped,
        settle_after: false,
        snapshot_after: false,
        schema: screenshot::schema,
        handler: run_screenshot,
    },
    "agent" => OpSpec {
        description: "Run an autonomous multi-step agent task",
        kind: OperationKind::SessionScoped,
        settle_after: true,
        snapshot_after: true,
        schema: agent::schema,
        handler: run_agent,
    },
    "create_session" => OpSpec {
        description: "Create or resume a browser session and make it current",
        kind: OperationKind::SetScoped,
        settle_after: false,
        snapshot_after: false,
        schema: session::create_schema,
        handler: run_create_session,
    },
    "close_session" => OpSpec {
        description: "Close a browser session",
        kind: OperationKind::SetScoped,
        settle_after: false,
        snapshot_after: false,
        schema: session::close_schema,
        handler: run_close_session,
    },
};

/// Look up an operation registration by name
pub fn lookup(name: &str) -> Option<&'static OpSpec> {
    CATALOG.get(name)
}

/// Deserialize an operation's argument object
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| Error::invalid_arguments(e.to_string()))
}

fn run_navigate(context: &AutomationContext, args: Value) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(navigate::run(context, args))
}

fn run_act(context: &AutomationContext, args: Value) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(act::run(context, args))
}

fn run_observe(context: &AutomationContext, args: Value) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(observe::run(context, args))
}

fn run_extract(context: &AutomationContext, args: Value) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(extract::run(context, args))
}

fn run_screenshot(context: &AutomationContext, args: Value) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(screenshot::run(context, args))
}

fn run_agent(context: &AutomationContext, args: Value) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(agent::run(context, args))
}

fn run_create_session(
    context: &AutomationContext,
    args: Value,
) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(session::create(context, args))
}

fn run_close_session(
    context: &AutomationContext,
    args: Value,
) -> BoxFuture<'_, Result<Vec<ContentBlock>>> {
    Box::pin(session::close(context, args))
}
