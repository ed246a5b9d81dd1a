//! Per-container bucket wrapper
//!
//! A `Bucket` ties a container's configuration to its store client and a
//! local scratch directory. Everything above this layer (sweeps, resize,
//! reconciler, handlers) talks to buckets, never to raw clients.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use stowage_core::ContainerConfig;
use tokio::fs;

use crate::keys::validate_bare_name;
use crate::traits::{ObjectEntry, StoreClient, StoreError, StoreResult};

/// Bounded retries for the benign scratch-file race in `read_bytes`.
const READ_ATTEMPTS: u32 = 3;

/// One configured container with its client and scratch space.
#[derive(Clone)]
pub struct Bucket {
    config: ContainerConfig,
    client: Arc<dyn StoreClient>,
    scratch_dir: PathBuf,
}

impl Bucket {
    pub fn new(
        config: ContainerConfig,
        client: Arc<dyn StoreClient>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        // Scratch is namespaced per container so equal names in different
        // containers cannot clobber each other's downloads.
        let scratch_dir = scratch_dir.into().join(&config.name);
        Bucket {
            config,
            client,
            scratch_dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn is_public(&self) -> bool {
        self.config.is_public
    }

    fn scratch_path(&self, file_name: &str) -> StoreResult<PathBuf> {
        validate_bare_name(file_name)?;
        Ok(self.scratch_dir.join(file_name))
    }

    async fn ensure_scratch_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.scratch_dir).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create scratch directory {}: {}",
                self.scratch_dir.display(),
                e
            ))
        })
    }

    /// List every object in the container.
    pub async fn list(&self) -> StoreResult<Vec<ObjectEntry>> {
        self.client.list().await
    }

    /// Upload a local file under the given bare name, overwriting in place.
    pub async fn upload(&self, local_path: &Path, file_name: &str) -> StoreResult<()> {
        validate_bare_name(file_name)?;
        self.client.upload(local_path, file_name).await
    }

    /// Delete an object. Absent keys still report success.
    pub async fn delete(&self, file_name: &str) -> StoreResult<bool> {
        validate_bare_name(file_name)?;
        self.client.delete(file_name).await
    }

    /// Signed URL a client can PUT an upload to.
    pub async fn signed_put_url(&self, file_name: &str, expires_in: Duration) -> StoreResult<String> {
        validate_bare_name(file_name)?;
        self.client.signed_put_url(file_name, expires_in).await
    }

    /// Download an object into this bucket's scratch directory and return
    /// the scratch path. Callers are expected to `discard_scratch` when done.
    pub async fn download_to_scratch(&self, file_name: &str) -> StoreResult<PathBuf> {
        let scratch = self.scratch_path(file_name)?;
        self.ensure_scratch_dir().await?;
        self.client.download(file_name, &scratch).await?;
        Ok(scratch)
    }

    /// Remove a scratch copy. Best effort; a copy already removed by a
    /// concurrent reader is fine.
    pub async fn discard_scratch(&self, file_name: &str) {
        if let Ok(scratch) = self.scratch_path(file_name) {
            let _ = fs::remove_file(&scratch).await;
        }
    }

    /// Read an object's bytes through local scratch.
    ///
    /// Only bare names are accepted; this is not a path-traversal
    /// primitive. A missing remote object is a hard error. The open can
    /// lose a benign race against a concurrent reader cleaning up the same
    /// scratch name, so the whole download-open-remove cycle retries up to
    /// three times; after that the failure is reported and `Ok(None)`
    /// returned.
    pub async fn read_bytes(&self, file_name: &str) -> StoreResult<Option<Vec<u8>>> {
        let scratch = self.scratch_path(file_name)?;
        self.ensure_scratch_dir().await?;

        for attempt in 1..=READ_ATTEMPTS {
            if !fs::try_exists(&scratch).await.unwrap_or(false) {
                self.client.download(file_name, &scratch).await?;
            }

            let bytes = match fs::read(&scratch).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(
                        container = %self.config.name,
                        file_name = %file_name,
                        attempt,
                        "scratch file vanished before open, retrying"
                    );
                    continue;
                }
                Err(e) => return Err(StoreError::IoError(e)),
            };

            let _ = fs::remove_file(&scratch).await;
            return Ok(Some(bytes));
        }

        tracing::error!(
            container = %self.config.name,
            file_name = %file_name,
            attempts = READ_ATTEMPTS,
            "giving up on object read after repeated scratch races"
        );
        Ok(None)
    }

    /// `read_bytes` encoded as standard base64, for embedding image bytes
    /// in documents and mails.
    pub async fn read_encoded(&self, file_name: &str) -> StoreResult<Option<String>> {
        let bytes = self.read_bytes(file_name).await?;
        Ok(bytes.map(|b| general_purpose::STANDARD.encode(b)))
    }

    /// Public URL for an object.
    ///
    /// Refuses non-public containers; access-controlled delivery must go
    /// through the caller's own authorization layer on top of
    /// `read_bytes`.
    pub fn public_url(&self, file_name: &str) -> StoreResult<String> {
        validate_bare_name(file_name)?;
        if !self.config.is_public {
            return Err(StoreError::NotPublic(self.config.name.clone()));
        }
        Ok(format!("{}{}", self.config.public_root(), file_name))
    }
}

/// Ready-to-use buckets keyed by container name, built once at startup.
#[derive(Default)]
pub struct BucketSet {
    buckets: HashMap<String, Arc<Bucket>>,
}

impl BucketSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bucket: Bucket) {
        self.buckets
            .insert(bucket.name().to_string(), Arc::new(bucket));
    }

    /// Look up the bucket for a container. An unknown name is a
    /// configuration error, never retried.
    pub fn get(&self, container_name: &str) -> StoreResult<Arc<Bucket>> {
        self.buckets.get(container_name).cloned().ok_or_else(|| {
            StoreError::ConfigError(format!(
                "no container named '{}' is configured",
                container_name
            ))
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.buckets.keys().map(|s| s.as_str()).collect()
    }
}
