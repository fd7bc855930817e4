//! Blob storage for uploaded images and their thumbnails.
//!
//! Blobs are addressed by kind and file name. [`FsBlobStore`] keeps them on
//! disk as `{base_dir}/{key}` for images and `{base_dir}/thumbs/{key}` for
//! thumbnails, the layout public image URLs map onto.

use async_trait::async_trait;
use bytes::Bytes;
use imghost_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Which family of blobs a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    /// Processed full-size image.
    Image,
    /// Thumbnail of an image.
    Thumbnail,
}

impl BlobKind {
    fn subdir(&self) -> Option<&'static str> {
        match self {
            Self::Image => None,
            Self::Thumbnail => Some("thumbs"),
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Thumbnail => f.write_str("thumbnail"),
        }
    }
}

/// Binary file storage keyed by file name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob, replacing any existing one with the same key.
    async fn store(&self, kind: BlobKind, key: &str, data: Bytes) -> Result<()>;

    /// Remove a blob. Returns `false` if it did not exist.
    async fn delete(&self, kind: BlobKind, key: &str) -> Result<bool>;
}

/// Filesystem-backed blob store.
pub struct FsBlobStore {
    base_dir: PathBuf,
}

impl FsBlobStore {
    /// Create a new `FsBlobStore` rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the image and thumbnail directories.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for kind in [BlobKind::Image, BlobKind::Thumbnail] {
            tokio::fs::create_dir_all(self.dir(kind)).await?;
        }
        Ok(())
    }

    fn dir(&self, kind: BlobKind) -> PathBuf {
        match kind.subdir() {
            Some(sub) => self.base_dir.join(sub),
            None => self.base_dir.clone(),
        }
    }

    /// Filesystem path for a blob. Keys must be plain file names.
    pub fn path_for(&self, kind: BlobKind, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir(kind).join(key))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let plain = !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(Error::invalid_input(format!("invalid blob key: {key:?}")))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, kind: BlobKind, key: &str, data: Bytes) -> Result<()> {
        let path = self.path_for(kind, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await.map_err(|e| {
            Error::storage(format!("failed to write {}: {e}", path.display()))
        })?;
        tracing::debug!(%kind, key, bytes = data.len(), "Stored blob");
        Ok(())
    }

    async fn delete(&self, kind: BlobKind, key: &str) -> Result<bool> {
        let path = self.path_for(kind, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!(
                "failed to delete {}: {e}",
                path.display()
            ))),
        }
    }
}
