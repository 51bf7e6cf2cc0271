//! Error types for the EMA client
//!
//! Each layer gets its own thiserror enum; `ClientError` wraps them for
//! callers that drive several layers at once (the context, the CLI).

use thiserror::Error;

use crate::events::ErrorResponse;

/// Main error type for the client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Hash state error: {0}")]
    HashState(#[from] HashStateError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Session storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to serialize navigation stack: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// URL fragment errors
#[derive(Error, Debug)]
pub enum HashStateError {
    #[error("Fragment is not valid percent-encoded UTF-8: {0}")]
    Decode(String),

    #[error("Fragment is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Fragment JSON is not an object")]
    NotAnObject,
}

/// Template rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template '{name}' is invalid: {message}")]
    Template { name: String, message: String },

    #[error("Template '{name}' failed to render: {message}")]
    Render { name: String, message: String },
}

/// Network transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request was cancelled by the client before it completed.
    #[error("Request aborted")]
    Aborted,

    /// No HTTP response was received (connection refused, DNS, TLS, ...).
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Web api call errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status (or no status at all).
    #[error("{} {} failed with status {}", .0.method, .0.url, .0.status)]
    Http(Box<ErrorResponse>),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call was cancelled through its token. Never reported on the bus.
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status of the failure, `0` when no response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(response) => Some(response.status),
            ApiError::Transport(TransportError::Network(_)) => Some(0),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ApiError::Cancelled | ApiError::Transport(TransportError::Aborted)
        )
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}
