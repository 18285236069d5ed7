//! Client configuration.
//!
//! Built from command-line arguments in the binary; every value has a
//! default matching the registration service's expectations.

use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    domain::{SessionStore, StoreError},
    infrastructure::session_store::{FileSessionStore, InMemorySessionStore},
};

/// Default registration service endpoint
pub const DEFAULT_URL: &str = "ws://localhost:5001/api/chat";
/// Quiet period before a form edit is pushed to the service
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
/// How long the "thinking" indicator waits for a reply
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 60;

/// Timing policy of a registration session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub debounce: Duration,
    pub reply_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            reply_timeout: Duration::from_secs(DEFAULT_REPLY_TIMEOUT_SECS),
        }
    }
}

/// Where the session identifier is kept between runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPersistence {
    /// `<data dir>/vitalink/session.json`
    #[default]
    DefaultFile,
    File(PathBuf),
    /// Forget the identifier when the process exits
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub session: SessionConfig,
    pub persistence: SessionPersistence,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            session: SessionConfig::default(),
            persistence: SessionPersistence::default(),
        }
    }
}

impl ClientConfig {
    /// Build the session store selected by `persistence`.
    ///
    /// # Errors
    ///
    /// Fails when the default location is requested but the platform has no
    /// data directory.
    pub fn session_store(&self) -> Result<Arc<dyn SessionStore>, StoreError> {
        let store: Arc<dyn SessionStore> = match &self.persistence {
            SessionPersistence::DefaultFile => {
                Arc::new(FileSessionStore::new(FileSessionStore::default_path()?))
            }
            SessionPersistence::File(path) => Arc::new(FileSessionStore::new(path.clone())),
            SessionPersistence::Disabled => Arc::new(InMemorySessionStore::new()),
        };
        Ok(store)
    }
}
