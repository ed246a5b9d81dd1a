use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::traits::{ObjectEntry, StoreClient, StoreError, StoreResult};

/// Local filesystem store client for one container.
///
/// Development and test backend; objects are plain files under a root
/// directory. Signed upload URLs are not supported.
#[derive(Clone)]
pub struct LocalStoreClient {
    root: PathBuf,
    container: String,
}

impl LocalStoreClient {
    /// Create a new client rooted at `root`, creating the directory if
    /// needed.
    pub async fn new(root: impl Into<PathBuf>, container: impl Into<String>) -> StoreResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create store directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalStoreClient {
            root,
            container: container.into(),
        })
    }

    /// Convert an object key to a filesystem path with traversal checks.
    fn key_to_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StoreError::InvalidKey(format!(
                "object key '{}' is not allowed",
                key
            )));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StoreClient for LocalStoreClient {
    async fn list(&self) -> StoreResult<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::ListFailed(e.to_string()))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::ListFailed(e.to_string()))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| StoreError::ListFailed(e.to_string()))?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            entries.push(ObjectEntry {
                key: entry.file_name().to_string_lossy().to_string(),
                last_modified: modified,
            });
        }

        tracing::debug!(
            container = %self.container,
            objects = entries.len(),
            "Local store list successful"
        );

        Ok(entries)
    }

    async fn download(&self, key: &str, local_path: &Path) -> StoreResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(key.to_string()));
        }

        fs::copy(&path, local_path).await.map_err(|e| {
            StoreError::DownloadFailed(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                local_path.display(),
                e
            ))
        })?;

        tracing::info!(
            container = %self.container,
            key = %key,
            "Local store download successful"
        );

        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StoreResult<()> {
        let path = self.key_to_path(key)?;

        fs::copy(local_path, &path).await.map_err(|e| {
            StoreError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            container = %self.container,
            key = %key,
            "Local store upload successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(true);
        }

        fs::remove_file(&path).await.map_err(|e| {
            StoreError::DeleteFailed(format!("Failed to delete {}: {}", path.display(), e))
        })?;

        tracing::info!(
            container = %self.container,
            key = %key,
            "Local store delete successful"
        );

        Ok(true)
    }

    async fn signed_put_url(&self, _key: &str, _expires_in: Duration) -> StoreResult<String> {
        Err(StoreError::Unsupported(
            "signed upload URLs require an S3 backend".to_string(),
        ))
    }
}
