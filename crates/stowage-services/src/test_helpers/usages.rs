//! Configurable usages for exercising the sweeps and the resize pipeline.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use stowage_core::{ClaimedFile, ContainerConfig, FileUsage, ImageUsage};
use uuid::Uuid;

/// Plain usage with a fixed deletion answer and retention offset.
pub struct TestUsage {
    kind: &'static str,
    container: ContainerConfig,
    reason: Option<String>,
    retention_offset: Duration,
}

impl TestUsage {
    pub fn new(kind: &'static str, container: ContainerConfig) -> Self {
        Self {
            kind,
            container,
            reason: None,
            retention_offset: Duration::days(30),
        }
    }

    /// Answer every deletion question with this reason.
    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Recompute retention as `now` plus this offset.
    pub fn with_retention_offset(mut self, offset: Duration) -> Self {
        self.retention_offset = offset;
        self
    }
}

impl FileUsage for TestUsage {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn container(&self) -> &ContainerConfig {
        &self.container
    }

    fn deletion_reason(&self, _record: &ClaimedFile, _now: DateTime<Utc>) -> Option<String> {
        self.reason.clone()
    }

    fn recompute_retention(&self, _record: &ClaimedFile, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.retention_offset
    }
}

/// Image usage that records every hook invocation.
pub struct TestImageUsage {
    base: TestUsage,
    bad_images: Arc<Mutex<Vec<(Uuid, String)>>>,
    extra_steps: Arc<Mutex<Vec<Uuid>>>,
    post_resizes: Arc<Mutex<Vec<Uuid>>>,
}

impl TestImageUsage {
    pub fn new(kind: &'static str, container: ContainerConfig) -> Self {
        Self {
            base: TestUsage::new(kind, container),
            bad_images: Arc::new(Mutex::new(Vec::new())),
            extra_steps: Arc::new(Mutex::new(Vec::new())),
            post_resizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.base = self.base.with_reason(reason);
        self
    }

    pub fn with_retention_offset(mut self, offset: Duration) -> Self {
        self.base = self.base.with_retention_offset(offset);
        self
    }

    pub fn bad_image_calls(&self) -> Vec<(Uuid, String)> {
        self.bad_images.lock().unwrap().clone()
    }

    pub fn extra_step_calls(&self) -> Vec<Uuid> {
        self.extra_steps.lock().unwrap().clone()
    }

    pub fn post_resize_calls(&self) -> Vec<Uuid> {
        self.post_resizes.lock().unwrap().clone()
    }
}

impl FileUsage for TestImageUsage {
    fn kind(&self) -> &'static str {
        self.base.kind()
    }

    fn container(&self) -> &ContainerConfig {
        self.base.container()
    }

    fn deletion_reason(&self, record: &ClaimedFile, now: DateTime<Utc>) -> Option<String> {
        self.base.deletion_reason(record, now)
    }

    fn recompute_retention(&self, record: &ClaimedFile, now: DateTime<Utc>) -> DateTime<Utc> {
        self.base.recompute_retention(record, now)
    }
}

#[async_trait]
impl ImageUsage for TestImageUsage {
    async fn notify_bad_image(&self, record: &ClaimedFile, detail: &str) {
        self.bad_images
            .lock()
            .unwrap()
            .push((record.id, detail.to_string()));
    }

    async fn extra_resize_steps(
        &self,
        record: &ClaimedFile,
        _scratch: &Path,
    ) -> Result<(), anyhow::Error> {
        self.extra_steps.lock().unwrap().push(record.id);
        Ok(())
    }

    async fn post_resize(&self, record: &ClaimedFile) -> Result<(), anyhow::Error> {
        self.post_resizes.lock().unwrap().push(record.id);
        Ok(())
    }
}
