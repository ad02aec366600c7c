use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sts_core::state::KeyValueStorage;
use sts_core::{CastingError, Result};

use super::atomic_file::AtomicTextFile;

/// Key-value storage backed by one JSON file per key under a directory.
///
/// Writes are atomic (tmp file + fsync + rename). Keys are sanitized into
/// file names, so `sts-casting-state` lands in `sts-casting-state.json`.
#[derive(Clone)]
pub struct FileKeyValueStorage {
    base_dir: Arc<PathBuf>,
}

impl FileKeyValueStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Arc::new(base_dir.into()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("{}.json", file_stem))
    }
}

#[async_trait]
impl KeyValueStorage for FileKeyValueStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file = AtomicTextFile::new(self.path_for(key));
        tokio::task::spawn_blocking(move || file.read().map_err(CastingError::from))
            .await
            .map_err(|e| CastingError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let file = AtomicTextFile::new(self.path_for(key));
        tracing::debug!("[FileKeyValueStorage] Writing {}", file.path().display());
        tokio::task::spawn_blocking(move || file.write(&value).map_err(CastingError::from))
            .await
            .map_err(|e| CastingError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileKeyValueStorage::new(temp_dir.path());
        assert!(storage.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileKeyValueStorage::new(temp_dir.path().join("state"));

        storage.set("sts-casting-state", "{}".to_string()).await.unwrap();

        assert_eq!(
            storage.get("sts-casting-state").await.unwrap().as_deref(),
            Some("{}")
        );
        assert!(temp_dir
            .path()
            .join("state")
            .join("sts-casting-state.json")
            .exists());
    }

    #[test]
    fn test_key_is_sanitized() {
        let storage = FileKeyValueStorage::new("/tmp/kv");
        assert_eq!(
            storage.path_for("../evil/key"),
            PathBuf::from("/tmp/kv/.._evil_key.json")
        );
    }
}
