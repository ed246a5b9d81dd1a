//! Usage contracts
//!
//! Every feature that claims uploaded files registers a usage: the record
//! kind it owns, the container its objects live in, and the two retention
//! questions every claimed file must be able to answer. Image-bearing kinds
//! additionally get resize hooks.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::ContainerConfig;
use crate::models::ClaimedFile;

/// Capability set every claimed-file kind must implement.
pub trait FileUsage: Send + Sync {
    /// Discriminant stored in the `kind` column.
    fn kind(&self) -> &'static str;

    /// Container this kind's objects live in.
    fn container(&self) -> &ContainerConfig;

    /// Why the object is no longer needed, or `None` while it still is.
    /// Records are only ever deleted with a non-empty reason.
    fn deletion_reason(&self, record: &ClaimedFile, now: DateTime<Utc>) -> Option<String>;

    /// Next `retain_until` for a record that is past its window but not yet
    /// deletable. Must be strictly after `now`; anything else is a contract
    /// violation that aborts the retention sweep.
    fn recompute_retention(&self, record: &ClaimedFile, now: DateTime<Utc>) -> DateTime<Utc>;
}

/// Hooks for kinds whose objects go through the resize pipeline.
/// All hooks default to no-ops.
#[async_trait]
pub trait ImageUsage: FileUsage {
    /// Called when the stored payload cannot be decoded as an image. The
    /// record stays unprocessed; there is no automatic retry.
    async fn notify_bad_image(&self, _record: &ClaimedFile, _detail: &str) {}

    /// Extra transformations applied to the scratch file after the standard
    /// normalization, before upload.
    async fn extra_resize_steps(
        &self,
        _record: &ClaimedFile,
        _scratch: &Path,
    ) -> Result<(), anyhow::Error> {
        Ok(())
    }

    /// Called after the resized object is uploaded and the record stamped.
    async fn post_resize(&self, _record: &ClaimedFile) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

/// Registry of usages by kind, built once at startup.
#[derive(Default)]
pub struct UsageRegistry {
    file_usages: HashMap<&'static str, Arc<dyn FileUsage>>,
    image_usages: HashMap<&'static str, Arc<dyn ImageUsage>>,
}

impl UsageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, usage: Arc<dyn FileUsage>) {
        self.file_usages.insert(usage.kind(), usage);
    }

    /// Image kinds answer the base capability set too, so the same usage
    /// lands in both maps.
    pub fn register_image<U>(&mut self, usage: Arc<U>)
    where
        U: ImageUsage + 'static,
    {
        self.file_usages.insert(usage.kind(), usage.clone());
        self.image_usages.insert(usage.kind(), usage);
    }

    pub fn file_usage(&self, kind: &str) -> Option<&Arc<dyn FileUsage>> {
        self.file_usages.get(kind)
    }

    pub fn image_usage(&self, kind: &str) -> Option<&Arc<dyn ImageUsage>> {
        self.image_usages.get(kind)
    }

    pub fn is_image_kind(&self, kind: &str) -> bool {
        self.image_usages.contains_key(kind)
    }

    /// Kinds the resize catch-up sweep scans for.
    pub fn image_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.image_usages.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticUsage {
        kind: &'static str,
        container: ContainerConfig,
    }

    impl FileUsage for StaticUsage {
        fn kind(&self) -> &'static str {
            self.kind
        }

        fn container(&self) -> &ContainerConfig {
            &self.container
        }

        fn deletion_reason(&self, _record: &ClaimedFile, _now: DateTime<Utc>) -> Option<String> {
            None
        }

        fn recompute_retention(&self, _record: &ClaimedFile, now: DateTime<Utc>) -> DateTime<Utc> {
            now + chrono::Duration::days(30)
        }
    }

    #[async_trait]
    impl ImageUsage for StaticUsage {}

    fn usage(kind: &'static str) -> Arc<StaticUsage> {
        Arc::new(StaticUsage {
            kind,
            container: ContainerConfig {
                name: "bucket-a".to_string(),
                access_key_id: "AKIA".to_string(),
                secret_access_key: "secret".to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
                is_public: false,
            },
        })
    }

    #[test]
    fn image_registration_covers_both_capability_sets() {
        let mut registry = UsageRegistry::new();
        registry.register_image(usage("image"));

        assert!(registry.file_usage("image").is_some());
        assert!(registry.image_usage("image").is_some());
        assert!(registry.is_image_kind("image"));
        assert_eq!(registry.image_kinds(), vec!["image"]);
    }

    #[test]
    fn plain_registration_is_not_an_image_kind() {
        let mut registry = UsageRegistry::new();
        registry.register(usage("report"));

        assert!(registry.file_usage("report").is_some());
        assert!(registry.image_usage("report").is_none());
        assert!(!registry.is_image_kind("report"));
    }

    #[test]
    fn unknown_kind_resolves_to_none() {
        let registry = UsageRegistry::new();
        assert!(registry.file_usage("ghost").is_none());
    }
}
