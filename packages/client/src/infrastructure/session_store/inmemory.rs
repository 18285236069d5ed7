//! In-memory session store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{SessionId, SessionStore, StoreError};

/// Keeps the session identifier for the lifetime of the process only
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session_id: Mutex<Option<SessionId>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            session_id: Mutex::new(Some(session_id)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<SessionId>, StoreError> {
        Ok(self.session_id.lock().await.clone())
    }

    async fn save(&self, session_id: &SessionId) -> Result<(), StoreError> {
        *self.session_id.lock().await = Some(session_id.clone());
        Ok(())
    }
}
