//! Built-in claimed-file kinds this deployment registers.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use stowage_core::{ClaimedFile, ContainerConfig, FileUsage, ImageUsage};

/// Retention granted to a claim whose window lapsed while the record is
/// still live.
const RETENTION_EXTENSION_DAYS: i64 = 30;

/// The built-in image kind: user-uploaded pictures that go through the
/// resize pipeline.
///
/// This kind never volunteers a deletion reason, so expired claims are
/// rescheduled indefinitely; features with a real release lifecycle
/// register their own usages alongside it.
pub struct StoredImage {
    container: ContainerConfig,
}

impl StoredImage {
    pub const KIND: &'static str = "image";

    pub fn new(container: ContainerConfig) -> Self {
        Self { container }
    }
}

impl FileUsage for StoredImage {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn container(&self) -> &ContainerConfig {
        &self.container
    }

    fn deletion_reason(&self, _record: &ClaimedFile, _now: DateTime<Utc>) -> Option<String> {
        None
    }

    fn recompute_retention(&self, _record: &ClaimedFile, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(RETENTION_EXTENSION_DAYS)
    }
}

#[async_trait]
impl ImageUsage for StoredImage {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn container() -> ContainerConfig {
        ContainerConfig {
            name: "bucket-a".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "test-secret".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            is_public: false,
        }
    }

    fn record() -> ClaimedFile {
        ClaimedFile {
            id: Uuid::new_v4(),
            file_name: "A1B2C3D.png".to_string(),
            kind: StoredImage::KIND.to_string(),
            created_at: Utc::now(),
            retain_until: Some(Utc::now()),
            processed_at: None,
            payload: json!({}),
        }
    }

    #[test]
    fn stored_images_are_never_volunteered_for_deletion() {
        let usage = StoredImage::new(container());
        assert_eq!(usage.deletion_reason(&record(), Utc::now()), None);
    }

    #[test]
    fn recomputed_retention_lies_in_the_future() {
        let usage = StoredImage::new(container());
        let now = Utc::now();
        let next = usage.recompute_retention(&record(), now);
        assert_eq!(next, now + Duration::days(RETENTION_EXTENSION_DAYS));
    }
}
