//! Unified error types for Drover

use std::net;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error-message fragments the engine reports when a session has died
/// underneath a live handle. Probe failures matching one of these are healed
/// by recreating the session instead of surfacing the failure.
pub const DEAD_SESSION_SIGNATURES: &[&str] = &[
    "Target page, context or browser has been closed",
    "Session expired",
    "context destroyed",
];

/// Unified error type for Drover
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network errors
    #[error("Network error: {0}")]
    Net(#[from] net::AddrParseError),

    /// HTTP transport errors talking to the engine
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine call failed
    #[error("Engine error: {0}")]
    Engine(String),

    /// Operation name not present in the catalog
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Operation arguments did not match the expected shape
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// No page could be resolved for the current session
    #[error("No active page available: {0}")]
    NoActivePage(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new engine error
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        Error::Engine(msg.into())
    }

    /// Create a new unknown operation error
    pub fn unknown_operation<S: Into<String>>(name: S) -> Self {
        Error::UnknownOperation(name.into())
    }

    /// Create a new invalid arguments error
    pub fn invalid_arguments<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArguments(msg.into())
    }

    /// Create a new no active page error
    pub fn no_active_page<S: Into<String>>(msg: S) -> Self {
        Error::NoActivePage(msg.into())
    }

    /// Create a new resource not found error
    pub fn resource_not_found<S: Into<String>>(uri: S) -> Self {
        Error::ResourceNotFound(uri.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error carries a recognized dead-session signature
    pub fn is_session_terminated(&self) -> bool {
        let msg = self.to_string();
        DEAD_SESSION_SIGNATURES.iter().any(|sig| msg.contains(sig))
    }

    /// Whether this error must surface as a protocol fault rather than an
    /// `isError` result envelope
    pub fn is_protocol_fault(&self) -> bool {
        matches!(
            self,
            Error::UnknownOperation(_) | Error::InvalidArguments(_) | Error::ResourceNotFound(_)
        )
    }
}

/// Convert Error to a JSON-RPC error object
impl From<Error> for crate::rpc::JsonRpcError {
    fn from(err: Error) -> Self {
        use crate::rpc::codes;

        match err {
            Error::UnknownOperation(_) | Error::InvalidArguments(_) => {
                crate::rpc::JsonRpcError::new(codes::INVALID_PARAMS, err.to_string())
            }
            Error::ResourceNotFound(_) => {
                crate::rpc::JsonRpcError::new(codes::RESOURCE_NOT_FOUND, err.to_string())
            }
            Error::Serialization(_) => {
                crate::rpc::JsonRpcError::new(codes::INVALID_REQUEST, err.to_string())
            }
            _ => crate::rpc::JsonRpcError::new(codes::INTERNAL_ERROR, err.to_string()),
        }
    }
}
