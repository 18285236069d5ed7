//! Session identifier and the store that keeps it across restarts.

use std::fmt;

use async_trait::async_trait;

use super::error::{SessionIdError, StoreError};

/// Opaque token issued by the remote service on first contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SessionIdError::Empty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Durable key-value slot holding the session identifier.
///
/// Read once when a channel opens and written whenever the server issues an
/// identifier. Implementations live in the infrastructure layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the cached identifier, if any
    async fn load(&self) -> Result<Option<SessionId>, StoreError>;

    /// Persist a newly issued identifier
    async fn save(&self, session_id: &SessionId) -> Result<(), StoreError>;
}
