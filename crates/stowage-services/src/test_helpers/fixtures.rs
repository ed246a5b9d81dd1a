//! Test fixtures and helper functions for creating test data

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use stowage_core::{ClaimedFile, ContainerConfig};
use stowage_storage::{Bucket, BucketSet};
use uuid::Uuid;

use super::recording_store::RecordingStore;

/// Container config for tests. Tests always build their config
/// explicitly; the process-wide registry is never consulted.
pub fn test_container(name: &str) -> ContainerConfig {
    ContainerConfig {
        name: name.to_string(),
        access_key_id: "AKIATEST".to_string(),
        secret_access_key: "test-secret".to_string(),
        region: "us-east-1".to_string(),
        endpoint: None,
        is_public: false,
    }
}

/// Unprocessed claimed file of the given kind with no retention window.
pub fn test_claimed(kind: &str, file_name: &str) -> ClaimedFile {
    ClaimedFile {
        id: Uuid::new_v4(),
        file_name: file_name.to_string(),
        kind: kind.to_string(),
        created_at: Utc::now(),
        retain_until: None,
        processed_at: None,
        payload: json!({}),
    }
}

/// Bucket set with a single recording-store-backed bucket.
pub fn recording_bucket_set(
    container: ContainerConfig,
    store: RecordingStore,
    scratch_dir: &Path,
) -> BucketSet {
    let mut set = BucketSet::new();
    set.insert(Bucket::new(container, Arc::new(store), scratch_dir));
    set
}
