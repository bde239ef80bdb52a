//! Local single-device store: one JSON file per key under a byte budget.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::backend::KeyValueBackend;
use crate::error::StoreError;

/// File-per-key store rooted in a single directory.
///
/// An optional capacity caps the total bytes across all keys; a write that
/// would exceed it fails with a quota error so the facade can evict.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    capacity: Option<u64>,
}

impl LocalStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), capacity: None }
    }

    /// Platform data directory, `./storyforge` as a last resort.
    #[must_use]
    pub fn default_root() -> PathBuf {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("storyforge")
    }

    /// Caps total stored bytes across all keys.
    #[must_use]
    pub const fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Total bytes stored under keys other than `except`.
    async fn used_bytes_excluding(&self, except: &Path) -> Result<u64, StoreError> {
        let mut total = 0;
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.path() == except {
                continue;
            }
            total += entry.metadata().await?.len();
        }
        Ok(total)
    }
}

#[async_trait]
impl KeyValueBackend for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(capacity) = self.capacity {
            let used = self.used_bytes_excluding(&path).await?;
            let wanted = used + value.len() as u64;
            if wanted > capacity {
                return Err(StoreError::QuotaExceeded(format!(
                    "write of {} bytes would use {wanted} of {capacity} budgeted bytes",
                    value.len()
                )));
            }
        }
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(path, value).await?;
        Ok(())
    }
}
