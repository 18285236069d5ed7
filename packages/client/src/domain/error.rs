//! Domain error types.

use thiserror::Error;

/// Errors raised by the form model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The given name does not match any form field
    #[error("Unknown form field '{0}'")]
    UnknownField(String),
}

/// Errors raised when constructing a session identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionIdError {
    #[error("Session identifier must not be empty")]
    Empty,
}

/// Errors raised by a session channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The channel is not in the `Open` state
    #[error("Channel is not open (state: {0})")]
    NotOpen(String),

    /// The connection task has already terminated
    #[error("Channel has been closed")]
    Closed,

    /// The outbound message could not be encoded
    #[error("Failed to serialize outbound message: {0}")]
    Serialize(String),
}

/// Errors raised by a session store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store is corrupted: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stored session identifier is invalid: {0}")]
    InvalidSessionId(#[from] SessionIdError),

    /// No platform data directory to place the default store in
    #[error("Could not determine the data directory")]
    NoDataDir,
}
