//! Store client abstraction
//!
//! This module defines the `StoreClient` trait all object-store backends
//! implement. A client is scoped to a single container.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Container '{0}' is not public")]
    NotPublic(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One object as reported by a container listing.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Object-store primitives for one container.
///
/// All backends (S3, local filesystem) implement this trait so the bucket
/// wrapper and the reconciler work against any of them. Transfers go
/// through local files: downloads land at a caller-chosen path, uploads
/// read from one.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// List every object in the container with its last-modified time.
    async fn list(&self) -> StoreResult<Vec<ObjectEntry>>;

    /// Download an object to a local file.
    ///
    /// A missing remote object is `StoreError::NotFound`.
    async fn download(&self, key: &str, local_path: &Path) -> StoreResult<()>;

    /// Upload a local file as an object, overwriting any existing object
    /// under the same key.
    async fn upload(&self, local_path: &Path, key: &str) -> StoreResult<()>;

    /// Delete an object.
    ///
    /// Idempotent at the store boundary: deleting a key that does not
    /// exist still reports success.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Generate a time-limited signed URL clients can PUT an upload to.
    ///
    /// Only supported by S3 backends; others return
    /// `StoreError::Unsupported`.
    async fn signed_put_url(&self, key: &str, expires_in: Duration) -> StoreResult<String>;
}
