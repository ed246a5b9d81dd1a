//! Resize pipeline
//!
//! One-way `unprocessed -> processed` per record, idempotent on re-entry.
//! Two triggers feed the same operation: the decoupled task fired right
//! after a claim, and the recurring catch-up sweep that recovers tasks
//! lost to process restarts. Correctness never depends on exactly-once
//! dispatch.

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use stowage_core::{ClaimedFile, UsageRegistry};
use stowage_db::{ClaimedFileStore, LedgerError};
use stowage_processing::{ImageNormalizer, ProcessingError};
use stowage_storage::{BucketSet, StoreError};
use thiserror::Error;
use tokio::time::interval;
use uuid::Uuid;

/// How far back the catch-up sweep looks for unprocessed records.
pub const CATCH_UP_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum ResizeError {
    /// Contract violation: resize is only defined for registered image
    /// kinds.
    #[error("kind '{0}' is not a registered image kind")]
    NotAnImageKind(String),

    /// A record with an empty file name cannot address an object.
    #[error("claimed file {0} has an empty file name")]
    EmptyFileName(Uuid),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("image processing failed: {0}")]
    Processing(#[from] ProcessingError),

    #[error("resize hook failed: {0}")]
    Hook(#[source] anyhow::Error),
}

/// What one resize invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Downloaded, normalized, uploaded and stamped.
    Completed,
    /// The record was already processed, or another worker won the stamp.
    AlreadyProcessed,
    /// The payload was not a decodable image; the bad-image hook ran and
    /// the record stays unprocessed. No automatic retry.
    Rejected,
    /// The record no longer exists.
    Missing,
}

#[derive(Clone)]
pub struct ResizeService {
    claimed: Arc<dyn ClaimedFileStore>,
    buckets: Arc<BucketSet>,
    registry: Arc<UsageRegistry>,
}

impl ResizeService {
    pub fn new(
        claimed: Arc<dyn ClaimedFileStore>,
        buckets: Arc<BucketSet>,
        registry: Arc<UsageRegistry>,
    ) -> Self {
        Self {
            claimed,
            buckets,
            registry,
        }
    }

    /// Fire the decoupled post-claim resize task.
    ///
    /// Once dispatched the task runs to completion independently of the
    /// caller; there are no cancellation semantics.
    pub fn dispatch(&self, id: Uuid) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            match service.resize_by_id(id).await {
                Ok(outcome) => {
                    tracing::debug!(record_id = %id, outcome = ?outcome, "Resize task finished");
                }
                Err(e) => tracing::error!(error = %e, record_id = %id, "Resize task failed"),
            }
        })
    }

    /// Re-fetch the record and resize it. The fresh fetch picks up stamps
    /// persisted by a racing worker.
    pub async fn resize_by_id(&self, id: Uuid) -> Result<ResizeOutcome, ResizeError> {
        match self.claimed.get(id).await? {
            Some(record) => self.resize(&record).await,
            None => Ok(ResizeOutcome::Missing),
        }
    }

    /// Normalize the record's object in place and stamp `processed_at`.
    #[tracing::instrument(skip(self, record), fields(record_id = %record.id, file_name = %record.file_name))]
    pub async fn resize(&self, record: &ClaimedFile) -> Result<ResizeOutcome, ResizeError> {
        let Some(usage) = self.registry.image_usage(&record.kind) else {
            return Err(ResizeError::NotAnImageKind(record.kind.clone()));
        };
        if record.is_processed() {
            return Ok(ResizeOutcome::AlreadyProcessed);
        }
        if record.file_name.is_empty() {
            return Err(ResizeError::EmptyFileName(record.id));
        }

        let start = Instant::now();
        let bucket = self.buckets.get(&usage.container().name)?;
        let scratch = bucket.download_to_scratch(&record.file_name).await?;

        let bytes = match tokio::fs::read(&scratch).await {
            Ok(bytes) => bytes,
            Err(e) => {
                bucket.discard_scratch(&record.file_name).await;
                return Err(ResizeError::Store(StoreError::IoError(e)));
            }
        };

        let normalized = match ImageNormalizer::normalize(&bytes) {
            Ok(normalized) => normalized,
            Err(ProcessingError::BadImage(detail)) => {
                bucket.discard_scratch(&record.file_name).await;
                tracing::warn!(
                    detail = %detail,
                    "Stored payload is not a decodable image, leaving record unprocessed"
                );
                usage.notify_bad_image(record, &detail).await;
                return Ok(ResizeOutcome::Rejected);
            }
            Err(e) => {
                bucket.discard_scratch(&record.file_name).await;
                return Err(ResizeError::Processing(e));
            }
        };

        if let Err(e) = tokio::fs::write(&scratch, &normalized.bytes).await {
            bucket.discard_scratch(&record.file_name).await;
            return Err(ResizeError::Store(StoreError::IoError(e)));
        }

        if let Err(e) = usage.extra_resize_steps(record, &scratch).await {
            bucket.discard_scratch(&record.file_name).await;
            return Err(ResizeError::Hook(e));
        }

        let uploaded = bucket.upload(&scratch, &record.file_name).await;
        bucket.discard_scratch(&record.file_name).await;
        uploaded?;

        let stamped = self.claimed.mark_processed(record.id, Utc::now()).await?;
        if !stamped {
            // A racing worker stamped first; its upload carried the same
            // normalized bytes, so there is nothing left to do.
            return Ok(ResizeOutcome::AlreadyProcessed);
        }

        usage.post_resize(record).await.map_err(ResizeError::Hook)?;

        tracing::info!(
            container = %usage.container().name,
            width = normalized.width,
            height = normalized.height,
            size_bytes = normalized.bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Resized image in place"
        );

        Ok(ResizeOutcome::Completed)
    }

    /// Catch-up sweep: resize recent unprocessed records of every
    /// registered image kind.
    #[tracing::instrument(skip(self, now))]
    pub async fn sweep_unprocessed(&self, now: DateTime<Utc>) -> Result<usize, ResizeError> {
        let created_after = now - Duration::days(CATCH_UP_WINDOW_DAYS);
        let mut completed = 0;

        for kind in self.registry.image_kinds() {
            let records = self.claimed.list_unprocessed(kind, created_after).await?;
            for record in records {
                match self.resize(&record).await {
                    Ok(ResizeOutcome::Completed) => completed += 1,
                    Ok(_) => {}
                    Err(err @ ResizeError::NotAnImageKind(_)) => return Err(err),
                    Err(err) => {
                        tracing::error!(
                            error = %err,
                            record_id = %record.id,
                            file_name = %record.file_name,
                            "Catch-up resize failed, will retry next sweep"
                        );
                    }
                }
            }
        }

        Ok(completed)
    }

    /// Start the recurring catch-up sweep.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>, interval_seconds: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(StdDuration::from_secs(interval_seconds));

            loop {
                tick.tick().await;

                match self.sweep_unprocessed(Utc::now()).await {
                    Ok(completed) => {
                        tracing::info!(completed, "Resize catch-up sweep completed");
                    }
                    Err(e) => tracing::error!(error = %e, "Resize catch-up sweep failed"),
                }
            }
        })
    }
}
