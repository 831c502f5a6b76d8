//! Error types for the relay core

use thiserror::Error;

/// Main error type for the relay core
#[derive(Error, Debug)]
pub enum RelayError {
    /// Storage collaborator error
    #[error("Storage error: {0}")]
    Store(String),

    /// Record lookup found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport layer error (SMS gateway, websocket write)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Command interpreter error
    #[error("Interpreter error: {0}")]
    Interpreter(String),

    /// Event payload missing or mistyping a required field
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The peer end of a session channel is gone
    #[error("Session closed")]
    SessionClosed,

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// JSON decode error when parsing payloads
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Create a storage error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an interpreter error
    pub fn interpreter(msg: impl Into<String>) -> Self {
        Self::Interpreter(msg.into())
    }

    /// Create an invalid-payload error
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
