//! Garbage collection
//!
//! Two sweeps share this service. The never-claimed sweep reclaims upload
//! authorizations nothing ever claimed; the retention sweep reclaims
//! claimed files whose window lapsed and whose usage can say why the
//! object is no longer needed. Both log and continue per record; contract
//! violations abort the run.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use stowage_core::{ClaimedFile, PendingUpload, UsageRegistry};
use stowage_db::{ClaimedFileStore, LedgerError, PendingUploadStore};
use stowage_storage::{BucketSet, StoreError};
use thiserror::Error;
use tokio::time::interval;
use uuid::Uuid;

/// Grace period before a never-claimed authorization is reclaimed. A
/// claim can lag its upload by however long a user takes to finish a
/// form, so the window is generous.
pub const GRACE_PERIOD_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum CleanupError {
    /// Contract violation: deleting a claimed file without a reason.
    /// "It is old" is never enough on its own.
    #[error("refusing to delete claimed file {id}: no deletion reason")]
    MissingDeletionReason { id: Uuid },

    /// Contract violation: a usage refused deletion but proposed a
    /// retention that is not in the future, which would reclaim forever.
    #[error("usage '{kind}' proposed retention {proposed} at {now}, which is not in the future")]
    RetentionContract {
        kind: String,
        proposed: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// No usage is registered for the record's kind.
    #[error("no usage registered for kind '{0}'")]
    UnknownKind(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts from one retention sweep run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetentionSweepOutcome {
    pub deleted: usize,
    pub rescheduled: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct CleanupService {
    pending: Arc<dyn PendingUploadStore>,
    claimed: Arc<dyn ClaimedFileStore>,
    buckets: Arc<BucketSet>,
    registry: Arc<UsageRegistry>,
}

impl CleanupService {
    pub fn new(
        pending: Arc<dyn PendingUploadStore>,
        claimed: Arc<dyn ClaimedFileStore>,
        buckets: Arc<BucketSet>,
        registry: Arc<UsageRegistry>,
    ) -> Self {
        Self {
            pending,
            claimed,
            buckets,
            registry,
        }
    }

    /// Start the recurring cleanup task running both sweeps.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>, interval_seconds: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(StdDuration::from_secs(interval_seconds));

            loop {
                tick.tick().await;
                let now = Utc::now();

                match self.sweep_never_claimed(now).await {
                    Ok(reclaimed) => {
                        tracing::info!(reclaimed, "Never-claimed sweep completed");
                    }
                    Err(e) => tracing::error!(error = %e, "Never-claimed sweep failed"),
                }

                match self.sweep_expired(now, None).await {
                    Ok(outcome) => {
                        tracing::info!(
                            deleted = outcome.deleted,
                            rescheduled = outcome.rescheduled,
                            skipped = outcome.skipped,
                            "Retention sweep completed"
                        );
                    }
                    Err(e) => tracing::error!(error = %e, "Retention sweep failed"),
                }
            }
        })
    }

    /// Whether some claimed file owns this pending entry's object.
    ///
    /// Matching is by container identity, not just name, because two
    /// containers may hold files of the same name. A record whose kind has
    /// no registered usage cannot be container-checked and counts as
    /// claimed; leaking one object to a later audit beats deleting a live
    /// one.
    pub async fn is_claimed(&self, entry: &PendingUpload) -> Result<bool, CleanupError> {
        let records = self.claimed.find_by_name(&entry.file_name).await?;
        for record in records {
            match self.registry.file_usage(&record.kind) {
                Some(usage) => {
                    if usage.container().name == entry.container_name {
                        return Ok(true);
                    }
                }
                None => {
                    tracing::warn!(
                        kind = %record.kind,
                        file_name = %entry.file_name,
                        "Claimed file has unregistered kind, treating as claimed"
                    );
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Sweep A: reclaim upload authorizations past the grace window.
    ///
    /// Unclaimed entries lose their object and the entry; claimed entries
    /// lose only the entry, since the object now belongs to the claimed
    /// file. Returns the number of entries resolved.
    #[tracing::instrument(skip(self, now))]
    pub async fn sweep_never_claimed(&self, now: DateTime<Utc>) -> Result<usize, CleanupError> {
        let cutoff = now - Duration::hours(GRACE_PERIOD_HOURS);
        let entries = self.pending.list_issued_before(cutoff).await?;
        let mut resolved = 0;

        for entry in entries {
            let claimed = match self.is_claimed(&entry).await {
                Ok(claimed) => claimed,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file_name = %entry.file_name,
                        "Failed to check claim state, skipping entry"
                    );
                    continue;
                }
            };

            if claimed {
                tracing::debug!(
                    container = %entry.container_name,
                    file_name = %entry.file_name,
                    "Pending entry resolved by a claim, dropping entry only"
                );
            } else {
                let bucket = match self.buckets.get(&entry.container_name) {
                    Ok(bucket) => bucket,
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            container = %entry.container_name,
                            file_name = %entry.file_name,
                            "No bucket for pending entry, skipping"
                        );
                        continue;
                    }
                };
                // Object first. If this fails the entry stays, and the
                // next run retries the pair.
                if let Err(e) = bucket.delete(&entry.file_name).await {
                    tracing::error!(
                        error = %e,
                        container = %entry.container_name,
                        file_name = %entry.file_name,
                        "Failed to delete abandoned object, keeping entry for next run"
                    );
                    continue;
                }
                tracing::info!(
                    container = %entry.container_name,
                    file_name = %entry.file_name,
                    "Reclaimed never-claimed upload"
                );
            }

            if let Err(e) = self.pending.delete(entry.id).await {
                tracing::error!(
                    error = %e,
                    file_name = %entry.file_name,
                    "Failed to delete pending entry"
                );
                continue;
            }
            resolved += 1;
        }

        Ok(resolved)
    }

    /// Sweep B: reclaim claimed files whose retention window lapsed.
    ///
    /// With `only_container` set, records belonging to another container
    /// are left entirely alone: no delete, no retention recompute, their
    /// `retain_until` stays stale.
    #[tracing::instrument(skip(self, now))]
    pub async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        only_container: Option<&str>,
    ) -> Result<RetentionSweepOutcome, CleanupError> {
        let records = self.claimed.list_expired(now).await?;
        let mut outcome = RetentionSweepOutcome::default();

        for record in records {
            let Some(usage) = self.registry.file_usage(&record.kind) else {
                tracing::warn!(
                    kind = %record.kind,
                    file_name = %record.file_name,
                    "No usage registered for kind, skipping record"
                );
                outcome.skipped += 1;
                continue;
            };

            if let Some(only) = only_container {
                if usage.container().name != only {
                    outcome.skipped += 1;
                    continue;
                }
            }

            match usage.deletion_reason(&record, now) {
                Some(reason) if !reason.is_empty() => {
                    match self.delete_claimed(&record, &reason).await {
                        Ok(()) => outcome.deleted += 1,
                        Err(err @ CleanupError::MissingDeletionReason { .. }) => return Err(err),
                        Err(err) => {
                            tracing::error!(
                                error = %err,
                                file_name = %record.file_name,
                                "Failed to delete expired claimed file"
                            );
                        }
                    }
                }
                _ => {
                    let proposed = usage.recompute_retention(&record, now);
                    if proposed <= now {
                        return Err(CleanupError::RetentionContract {
                            kind: record.kind.clone(),
                            proposed,
                            now,
                        });
                    }
                    match self.claimed.set_retain_until(record.id, proposed).await {
                        Ok(()) => {
                            tracing::debug!(
                                file_name = %record.file_name,
                                retain_until = %proposed,
                                "Rescheduled retention"
                            );
                            outcome.rescheduled += 1;
                        }
                        Err(err) => {
                            tracing::error!(
                                error = %err,
                                file_name = %record.file_name,
                                "Failed to persist recomputed retention"
                            );
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Delete a claimed file and its backing object.
    ///
    /// A non-empty reason is mandatory; without one the call fails and
    /// leaves both untouched. The object goes first so a failed store
    /// delete keeps the record for the next run.
    pub async fn delete_claimed(
        &self,
        record: &ClaimedFile,
        reason: &str,
    ) -> Result<(), CleanupError> {
        if reason.is_empty() {
            return Err(CleanupError::MissingDeletionReason { id: record.id });
        }

        let Some(usage) = self.registry.file_usage(&record.kind) else {
            return Err(CleanupError::UnknownKind(record.kind.clone()));
        };
        let bucket = self.buckets.get(&usage.container().name)?;
        bucket.delete(&record.file_name).await?;
        self.claimed.delete(record.id).await?;

        tracing::info!(
            container = %usage.container().name,
            file_name = %record.file_name,
            kind = %record.kind,
            reason = %reason,
            "Deleted expired claimed file"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        test_claimed, test_container, MemoryClaimedStore, MemoryPendingStore, RecordingStore,
        TestUsage,
    };
    use stowage_storage::{Bucket, BucketSet};
    use tempfile::tempdir;

    struct Setup {
        service: CleanupService,
        pending: MemoryPendingStore,
        claimed: MemoryClaimedStore,
        store: RecordingStore,
        _scratch: tempfile::TempDir,
    }

    /// Cleanup service over bucket-a and bucket-b with one plain usage
    /// per bucket, built from the given usages.
    fn setup_with(usages: Vec<TestUsage>) -> Setup {
        let scratch = tempdir().unwrap();
        let pending = MemoryPendingStore::new();
        let claimed = MemoryClaimedStore::new();
        let store = RecordingStore::new();

        let mut buckets = BucketSet::new();
        for name in ["bucket-a", "bucket-b"] {
            buckets.insert(Bucket::new(
                test_container(name),
                Arc::new(store.clone()),
                scratch.path(),
            ));
        }

        let mut registry = UsageRegistry::new();
        for usage in usages {
            registry.register(Arc::new(usage));
        }

        let service = CleanupService::new(
            Arc::new(pending.clone()),
            Arc::new(claimed.clone()),
            Arc::new(buckets),
            Arc::new(registry),
        );

        Setup {
            service,
            pending,
            claimed,
            store,
            _scratch: scratch,
        }
    }

    fn hours_ago(hours: i64) -> DateTime<Utc> {
        Utc::now() - Duration::hours(hours)
    }

    #[tokio::test]
    async fn test_sweep_a_reclaims_unclaimed_object_and_entry() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))]);
        setup.store.set_object("STALE01.png", b"bytes".to_vec());
        setup
            .pending
            .add_entry("STALE01.png", "bucket-a", hours_ago(25));

        let resolved = setup.service.sweep_never_claimed(Utc::now()).await.unwrap();

        assert_eq!(resolved, 1);
        assert!(!setup.store.has_object("STALE01.png"));
        assert!(setup.pending.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_a_keeps_object_once_claimed() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))]);
        setup.store.set_object("USED001.png", b"bytes".to_vec());
        setup
            .pending
            .add_entry("USED001.png", "bucket-a", hours_ago(25));
        setup.claimed.add_record(test_claimed("report", "USED001.png"));

        let resolved = setup.service.sweep_never_claimed(Utc::now()).await.unwrap();

        assert_eq!(resolved, 1);
        assert!(setup.store.has_object("USED001.png"));
        assert!(setup.pending.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_a_grace_window_is_inclusive() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))]);
        let now = Utc::now();
        setup.store.set_object("ONEDGE1.png", b"a".to_vec());
        setup.store.set_object("FRESH01.png", b"b".to_vec());
        setup
            .pending
            .add_entry("ONEDGE1.png", "bucket-a", now - Duration::hours(24));
        setup
            .pending
            .add_entry("FRESH01.png", "bucket-a", now - Duration::hours(23));

        let resolved = setup.service.sweep_never_claimed(now).await.unwrap();

        assert_eq!(resolved, 1);
        assert!(!setup.store.has_object("ONEDGE1.png"));
        assert!(setup.store.has_object("FRESH01.png"));
        assert!(setup.pending.has_name("FRESH01.png"));
    }

    #[tokio::test]
    async fn test_sweep_a_claim_in_other_container_does_not_count() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-b"))]);
        setup.store.set_object("SHARED1.png", b"bytes".to_vec());
        setup
            .pending
            .add_entry("SHARED1.png", "bucket-a", hours_ago(25));
        // Same name, but the usage lives in bucket-b.
        setup.claimed.add_record(test_claimed("report", "SHARED1.png"));

        setup.service.sweep_never_claimed(Utc::now()).await.unwrap();

        assert!(!setup.store.has_object("SHARED1.png"));
        assert!(setup.pending.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_b_deletes_when_usage_gives_a_reason() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))
            .with_reason("superseded by a newer upload")]);
        setup.store.set_object("OLDREP1.png", b"bytes".to_vec());
        let mut record = test_claimed("report", "OLDREP1.png");
        record.retain_until = Some(hours_ago(1));
        setup.claimed.add_record(record.clone());

        let outcome = setup.service.sweep_expired(Utc::now(), None).await.unwrap();

        assert_eq!(outcome.deleted, 1);
        assert!(!setup.store.has_object("OLDREP1.png"));
        assert!(setup.claimed.record(record.id).is_none());
    }

    #[tokio::test]
    async fn test_sweep_b_reschedules_when_usage_has_no_reason() {
        let setup = setup_with(vec![
            TestUsage::new("report", test_container("bucket-a"))
                .with_retention_offset(Duration::days(30)),
        ]);
        setup.store.set_object("KEEPME1.png", b"bytes".to_vec());
        let mut record = test_claimed("report", "KEEPME1.png");
        record.retain_until = Some(hours_ago(1));
        setup.claimed.add_record(record.clone());

        let now = Utc::now();
        let outcome = setup.service.sweep_expired(now, None).await.unwrap();

        assert_eq!(outcome.rescheduled, 1);
        assert!(setup.store.has_object("KEEPME1.png"));
        let updated = setup.claimed.record(record.id).unwrap();
        assert!(updated.retain_until.unwrap() > now);
    }

    #[tokio::test]
    async fn test_sweep_b_past_or_present_recompute_is_fatal() {
        // Zero offset proposes retention == now, which is never allowed.
        let setup = setup_with(vec![
            TestUsage::new("report", test_container("bucket-a"))
                .with_retention_offset(Duration::zero()),
        ]);
        setup.store.set_object("BROKEN1.png", b"bytes".to_vec());
        let mut record = test_claimed("report", "BROKEN1.png");
        let stale = hours_ago(1);
        record.retain_until = Some(stale);
        setup.claimed.add_record(record.clone());

        let result = setup.service.sweep_expired(Utc::now(), None).await;

        assert!(matches!(
            result,
            Err(CleanupError::RetentionContract { .. })
        ));
        assert!(setup.store.has_object("BROKEN1.png"));
        assert_eq!(
            setup.claimed.record(record.id).unwrap().retain_until,
            Some(stale)
        );
    }

    #[tokio::test]
    async fn test_sweep_b_skips_other_containers_without_recompute() {
        let setup = setup_with(vec![
            TestUsage::new("report-a", test_container("bucket-a")),
            TestUsage::new("report-b", test_container("bucket-b")),
        ]);
        let stale = hours_ago(1);
        let mut in_scope = test_claimed("report-a", "INSIDE1.png");
        in_scope.retain_until = Some(stale);
        let mut out_of_scope = test_claimed("report-b", "OUTSIDE.png");
        out_of_scope.retain_until = Some(stale);
        setup.claimed.add_record(in_scope.clone());
        setup.claimed.add_record(out_of_scope.clone());

        let outcome = setup
            .service
            .sweep_expired(Utc::now(), Some("bucket-a"))
            .await
            .unwrap();

        assert_eq!(outcome.rescheduled, 1);
        assert_eq!(outcome.skipped, 1);
        // The skipped record keeps its stale retention.
        assert_eq!(
            setup.claimed.record(out_of_scope.id).unwrap().retain_until,
            Some(stale)
        );
        assert!(setup.claimed.record(in_scope.id).unwrap().retain_until.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn test_sweep_b_skips_unknown_kinds() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))]);
        let mut record = test_claimed("ghost", "GHOSTLY.png");
        record.retain_until = Some(hours_ago(1));
        setup.claimed.add_record(record.clone());

        let outcome = setup.service.sweep_expired(Utc::now(), None).await.unwrap();

        assert_eq!(outcome.skipped, 1);
        assert!(setup.claimed.record(record.id).is_some());
    }

    #[tokio::test]
    async fn test_sweep_b_never_sees_null_retention() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))
            .with_reason("would delete if eligible")]);
        setup.store.set_object("FOREVER.png", b"bytes".to_vec());
        setup.claimed.add_record(test_claimed("report", "FOREVER.png"));

        let outcome = setup.service.sweep_expired(Utc::now(), None).await.unwrap();

        assert_eq!(outcome.deleted, 0);
        assert!(setup.store.has_object("FOREVER.png"));
    }

    #[tokio::test]
    async fn test_delete_claimed_requires_a_reason() {
        let setup = setup_with(vec![TestUsage::new("report", test_container("bucket-a"))]);
        setup.store.set_object("GUARDED.png", b"bytes".to_vec());
        let record = test_claimed("report", "GUARDED.png");
        setup.claimed.add_record(record.clone());

        let result = setup.service.delete_claimed(&record, "").await;

        assert!(matches!(
            result,
            Err(CleanupError::MissingDeletionReason { .. })
        ));
        assert!(setup.store.has_object("GUARDED.png"));
        assert!(setup.claimed.record(record.id).is_some());
    }
}
