//! File-backed session store.
//!
//! The identifier is kept in a small JSON document under the fixed key
//! `user_id`:
//!
//! ```text
//! {"user_id": "3f2b6c1e-..."}
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{SessionId, SessionStore, StoreError};

const APP_DIR: &str = "vitalink";
const FILE_NAME: &str = "session.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default)]
    user_id: Option<String>,
}

/// Stores the session identifier in a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<data dir>/vitalink/session.json`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let data_dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(data_dir.join(APP_DIR).join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<SessionId>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No session file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let document: SessionDocument = serde_json::from_str(&content)?;
        match document.user_id {
            Some(user_id) if !user_id.trim().is_empty() => Ok(Some(SessionId::new(user_id)?)),
            _ => Ok(None),
        }
    }

    async fn save(&self, session_id: &SessionId) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let document = SessionDocument {
            user_id: Some(session_id.as_str().to_string()),
        };
        let content = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(&self.path, content).await?;

        tracing::debug!("Saved session identifier to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_returns_none() {
        // テスト項目: ファイルが存在しない場合はセッション ID 無しとして扱われる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        // when (操作):
        let result = store.load().await;

        // then (期待する結果):
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_save_then_load_in_nested_directory() {
        // テスト項目: 保存したセッション ID を次回起動時に読み出せる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileSessionStore::new(&path);
        let session_id = SessionId::new("u-123").unwrap();

        // when (操作):
        store.save(&session_id).await.unwrap();
        let reopened = FileSessionStore::new(&path);
        let loaded = reopened.load().await.unwrap();

        // then (期待する結果):
        assert_eq!(loaded, Some(session_id));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_identifier() {
        // テスト項目: 新しいセッション ID で上書きされる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&SessionId::new("old").unwrap()).await.unwrap();

        // when (操作):
        store.save(&SessionId::new("new").unwrap()).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.load().await.unwrap(), Some(SessionId::new("new").unwrap()));
    }

    #[tokio::test]
    async fn test_load_corrupted_file_is_an_error() {
        // テスト項目: 壊れたファイルはエラーとして報告される
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new(&path);

        // when (操作):
        let result = store.load().await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[tokio::test]
    async fn test_load_blank_identifier_returns_none() {
        // テスト項目: 空のセッション ID は未保存として扱われる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"user_id":""}"#).unwrap();
        let store = FileSessionStore::new(&path);

        // when (操作):
        let result = store.load().await;

        // then (期待する結果):
        assert!(matches!(result, Ok(None)));
    }
}
