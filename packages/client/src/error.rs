//! Error types for the registration client.

use thiserror::Error;

use crate::domain::{FormError, StoreError};

/// Client-level errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session store could not be set up
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// The terminal could not be initialised
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Errors in a line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '/{0}'. Type /help for the list of commands")]
    UnknownCommand(String),

    #[error("Usage: /set <field> <value>")]
    MissingField,

    #[error(transparent)]
    Form(#[from] FormError),
}
