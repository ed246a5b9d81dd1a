use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use stowage_core::ContainerConfig;

use crate::traits::{ObjectEntry, StoreClient, StoreError, StoreResult};

/// S3 store client for one container.
#[derive(Clone)]
pub struct S3StoreClient {
    store: AmazonS3,
    container: String,
}

impl S3StoreClient {
    /// Create a new client from an explicit container configuration.
    ///
    /// Credentials come from the config, never from ambient environment
    /// lookup; a misconfigured container surfaces here, at startup.
    pub fn new(config: &ContainerConfig) -> StoreResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_region(config.region.clone())
            .with_bucket_name(config.name.clone())
            .with_access_key_id(config.access_key_id.clone())
            .with_secret_access_key(config.secret_access_key.clone());

        if let Some(ref endpoint) = config.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::ConfigError(e.to_string()))?;

        Ok(S3StoreClient {
            store,
            container: config.name.clone(),
        })
    }
}

#[async_trait]
impl StoreClient for S3StoreClient {
    async fn list(&self) -> StoreResult<Vec<ObjectEntry>> {
        let start = std::time::Instant::now();
        let mut stream = self.store.list(None);
        let mut entries = Vec::new();

        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(|e| {
                tracing::error!(
                    error = %e,
                    container = %self.container,
                    "S3 list failed"
                );
                StoreError::ListFailed(e.to_string())
            })?;
            entries.push(ObjectEntry {
                key: meta.location.to_string(),
                last_modified: meta.last_modified,
            });
        }

        tracing::debug!(
            container = %self.container,
            objects = entries.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(entries)
    }

    async fn download(&self, key: &str, local_path: &Path) -> StoreResult<()> {
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StoreError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    container = %self.container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StoreError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StoreError::DownloadFailed(e.to_string()))?;
        let size = bytes.len() as u64;

        tokio::fs::write(local_path, &bytes).await.map_err(|e| {
            StoreError::DownloadFailed(format!(
                "Failed to write {}: {}",
                local_path.display(),
                e
            ))
        })?;

        tracing::info!(
            container = %self.container,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StoreResult<()> {
        let start = std::time::Instant::now();
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StoreError::UploadFailed(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = ObjectPath::from(key.to_string());

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                container = %self.container,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StoreError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            container = %self.container,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            // Deleting an absent key counts as success; delete is
            // idempotent at the store boundary.
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(
                    container = %self.container,
                    key = %key,
                    "S3 delete of absent key"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    container = %self.container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StoreError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            container = %self.container,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(true)
    }

    async fn signed_put_url(&self, key: &str, expires_in: Duration) -> StoreResult<String> {
        let location = ObjectPath::from(key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StoreError::ConfigError(e.to_string()))?
            .to_string();

        Ok(url)
    }
}
