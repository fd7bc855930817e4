//! Durable storage backends for the [`Document`].

use async_trait::async_trait;
use imghost_common::{Error, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::Document;

/// Where the document lives between process runs.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Read the stored document, or `None` if nothing has been stored yet.
    ///
    /// Unreadable or corrupt data is an error, never `None`.
    async fn load(&self) -> Result<Option<Document>>;

    /// Replace the stored document.
    async fn save(&self, document: &Document) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on every save.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// File name used inside a data directory.
    pub const FILE_NAME: &'static str = "db.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `{data_dir}/db.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<Document>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let document = serde_json::from_slice(&bytes).map_err(|e| {
            Error::storage(format!("corrupt document {}: {e}", self.path.display()))
        })?;
        Ok(Some(document))
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let json = serde_json::to_vec_pretty(document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::storage(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| Error::storage(format!("failed to write {}: {e}", temp.display())))?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            Error::storage(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

/// In-memory storage for tests and dry runs.
///
/// Saves can be made to fail or to take a while, and are counted.
#[derive(Default)]
pub struct MemoryStorage {
    document: Mutex<Option<Document>>,
    fail_saves: AtomicBool,
    save_delay_ms: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `document`.
    pub fn with_document(document: Document) -> Self {
        let storage = Self::default();
        *storage.document.lock() = Some(document);
        storage
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Delay every subsequent save by `delay`.
    pub fn set_save_delay(&self, delay: Duration) {
        self.save_delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved document.
    pub fn stored(&self) -> Option<Document> {
        self.document.lock().clone()
    }
}

#[async_trait]
impl DocumentStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<Document>> {
        Ok(self.document.lock().clone())
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::storage("injected save failure"));
        }
        *self.document.lock() = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_json_file_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::in_dir(dir.path());
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_file_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::in_dir(&dir.path().join("nested"));

        let doc = Document::initial();
        storage.save(&doc).await.unwrap();

        assert!(storage.path().exists());
        assert!(!storage.temp_path().exists());
        assert_eq!(storage.load().await.unwrap(), Some(doc));

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        assert!(raw.contains("\"branding\""));
        assert!(raw.contains('\n'));
    }

    #[tokio::test]
    async fn test_json_file_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::in_dir(dir.path());
        std::fs::write(storage.path(), b"{ \"users\": [").unwrap();

        assert_matches!(storage.load().await, Err(Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_memory_storage_failure_injection() {
        let storage = MemoryStorage::new();
        storage.set_fail_saves(true);
        assert!(storage.save(&Document::initial()).await.is_err());
        assert_eq!(storage.save_count(), 0);

        storage.set_fail_saves(false);
        storage.save(&Document::initial()).await.unwrap();
        assert_eq!(storage.save_count(), 1);
        assert!(storage.stored().is_some());
    }
}
