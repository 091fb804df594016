//! Persistent single-slot token storage

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Holds at most one auth token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StorageError>;

    async fn save(&self, token: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory store, used by tests and one-shot sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some(token.into())),
        }
    }

    /// Synchronous peek, handy in assertions
    pub fn peek(&self) -> Option<String> {
        self.slot.read().clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.read().clone())
    }

    async fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.slot.write() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.slot.write().take();
        Ok(())
    }
}

/// On-disk token record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenRecord {
    token: String,
    saved_at: DateTime<Utc>,
}

/// JSON file store (`~/.dancing/token.json` by default)
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location, `None` without a home directory
    pub fn default_location() -> Option<Self> {
        dancing_config::default_token_path().map(Self::new)
    }

    /// Store at `storage.token_path`, with `~/` expanded
    pub fn from_config(storage: &dancing_config::StorageConfig) -> Option<Self> {
        dancing_config::expand_tilde(&storage.token_path).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_blocking(path: &Path) -> Result<Option<String>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let record: TokenRecord = serde_json::from_str(&content)?;
        if record.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(record.token))
    }

    fn write_blocking(path: &Path, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = TokenRecord {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&record)?;
        std::fs::write(path, content)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = std::fs::set_permissions(path, perms) {
                tracing::warn!("Failed to restrict token file permissions: {}", e);
            }
        }

        Ok(())
    }

    fn remove_blocking(path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read_blocking(&path))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    async fn save(&self, token: &str) -> Result<(), StorageError> {
        let path = self.path.clone();
        let token = token.to_string();
        tokio::task::spawn_blocking(move || Self::write_blocking(&path, &token))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::remove_blocking(&path))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_single_slot() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save("first").await.unwrap();
        store.save("second").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("second"));

        store.clear().await.unwrap();
        assert!(store.peek().is_none());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save("abc").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("abc"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"saved_at\""));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);

        // clearing an absent file is fine
        store.clear().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store.save("secret").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(store.load().await, Err(StorageError::Json(_))));
    }
}
