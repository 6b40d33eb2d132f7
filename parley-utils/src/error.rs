//! Error types for parley
//!
//! Provides a unified error type used across all parley crates.

use std::path::PathBuf;

/// Main error type for parley operations
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Connection Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Not connected to the chat server")]
    ConnectionNotReady,

    // === Upload Errors ===

    #[error("An upload is already in progress")]
    UploadBusy,

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error only reflects a control the UI should have disabled
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::ConnectionNotReady | Self::UploadBusy)
    }
}

/// Result type alias using ParleyError
pub type Result<T> = std::result::Result<T, ParleyError>;
