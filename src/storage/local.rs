//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── snapshots/
//!     └── {source-slug}.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStorage;
use crate::utils::slugify;

/// Local filesystem storage backend for one source.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    key: String,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the given directory for `source_name`.
    pub fn new(root_dir: impl Into<PathBuf>, source_name: &str) -> Self {
        Self {
            root_dir: root_dir.into(),
            key: format!("snapshots/{}.json", slugify(source_name)),
        }
    }

    /// Full path of the snapshot document.
    pub fn snapshot_path(&self) -> PathBuf {
        self.path(&self.key)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn load(&self) -> Result<Option<Snapshot>> {
        self.read_json(&self.key).await
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_json(&self.key, snapshot).await?;
        log::debug!(
            "Saved {} records ({}) to {}",
            snapshot.len(),
            snapshot.short_fingerprint(),
            self.key
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.snapshot_path().display().to_string()
    }
}
