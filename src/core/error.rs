//! Error types and handling for the gateway server.
//!
//! This module defines a unified error type for startup and host-surface
//! failures. Invocation-path failures never use this type: the dispatcher
//! converts them into the closed `ToolResponse` envelope taxonomy instead.

use thiserror::Error;

/// A specialized Result type for gateway server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the gateway server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the prompts domain.
    #[error("Prompt error: {0}")]
    Prompt(#[from] crate::domains::prompts::PromptError),

    /// Configuration-related errors. Raised at startup when a required
    /// option is missing or malformed; excluded from the runtime taxonomy.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
