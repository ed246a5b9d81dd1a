//! Bucket set construction from container configuration.

use std::path::Path;
use std::sync::Arc;

use stowage_core::ContainerConfig;

#[cfg(feature = "storage-s3")]
use crate::s3::S3StoreClient;
use crate::{Bucket, BucketSet, StoreResult};

/// Build one S3-backed bucket per configured container.
///
/// Misconfigured credentials fail here, at startup, rather than inside a
/// sweep.
pub fn build_bucket_set(
    containers: &[ContainerConfig],
    scratch_dir: &Path,
) -> StoreResult<BucketSet> {
    let mut set = BucketSet::new();

    for config in containers {
        #[cfg(feature = "storage-s3")]
        {
            let client = S3StoreClient::new(config)?;
            set.insert(Bucket::new(config.clone(), Arc::new(client), scratch_dir));
        }

        #[cfg(not(feature = "storage-s3"))]
        {
            let _ = config;
            return Err(crate::StoreError::ConfigError(
                "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
            ));
        }
    }

    Ok(set)
}
