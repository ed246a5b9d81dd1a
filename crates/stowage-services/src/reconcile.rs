//! Reconciliation audit
//!
//! Compares a container's actual contents against the union of all
//! pending and claimed file names, surfacing objects nothing accounts
//! for. The destructive path is gated: a non-production database pointed
//! at a production container would see the whole production population as
//! unaccounted, and this gate is what stands between that mistake and
//! mass deletion.

use std::collections::HashSet;
use std::sync::Arc;

use stowage_db::{ClaimedFileStore, LedgerError, PendingUploadStore};
use stowage_storage::{BucketSet, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Destructive reconciliation requires an explicitly declared
    /// allow-list of non-production containers.
    #[error("no non-production container allow-list is declared; refusing to delete")]
    MissingAllowList,

    /// The target container is not declared non-production and the
    /// production flag does not explicitly clear it.
    #[error("container '{0}' is not declared non-production; refusing to delete")]
    ProductionGuard(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Deployment facts the destructive path is gated on.
///
/// `production` mirrors the deployment flag and is `None` when the
/// environment did not state it either way; ambiguity blocks deletion.
#[derive(Debug, Clone, Default)]
pub struct SafetyPolicy {
    pub non_production_containers: Option<Vec<String>>,
    pub production: Option<bool>,
}

impl SafetyPolicy {
    /// Whether deleting from `container` is permitted: the container must
    /// be on the declared non-production allow-list, or the production
    /// flag must be explicitly false.
    pub fn allows_delete(&self, container: &str) -> Result<(), ReconcileError> {
        let Some(allowed) = &self.non_production_containers else {
            return Err(ReconcileError::MissingAllowList);
        };
        if allowed.iter().any(|name| name == container) {
            return Ok(());
        }
        match self.production {
            Some(false) => Ok(()),
            _ => Err(ReconcileError::ProductionGuard(container.to_string())),
        }
    }
}

/// Audit pass comparing actual store contents to ledger state.
pub struct Reconciler {
    pending: Arc<dyn PendingUploadStore>,
    claimed: Arc<dyn ClaimedFileStore>,
    buckets: Arc<BucketSet>,
    policy: SafetyPolicy,
}

impl Reconciler {
    pub fn new(
        pending: Arc<dyn PendingUploadStore>,
        claimed: Arc<dyn ClaimedFileStore>,
        buckets: Arc<BucketSet>,
        policy: SafetyPolicy,
    ) -> Self {
        Self {
            pending,
            claimed,
            buckets,
            policy,
        }
    }

    /// Objects present in the container but absent from both ledgers.
    ///
    /// Known names are unioned across every container on purpose: a name
    /// reused across containers then only under-reports, it never makes
    /// the audit touch a live object. With `also_delete` the safety gate
    /// runs before anything else, so a refusal means zero deletes.
    #[tracing::instrument(skip(self))]
    pub async fn find_unaccounted(
        &self,
        container: &str,
        also_delete: bool,
    ) -> Result<Vec<String>, ReconcileError> {
        if also_delete {
            self.policy.allows_delete(container)?;
        }

        let bucket = self.buckets.get(container)?;
        let objects = bucket.list().await?;

        let mut known: HashSet<String> = self.pending.list_names().await?.into_iter().collect();
        known.extend(self.claimed.list_names().await?);

        let mut unaccounted: Vec<String> = objects
            .into_iter()
            .map(|entry| entry.key)
            .filter(|key| !known.contains(key))
            .collect();
        unaccounted.sort();

        tracing::info!(
            unaccounted = unaccounted.len(),
            known = known.len(),
            "Reconciliation pass finished"
        );

        if also_delete {
            for key in &unaccounted {
                bucket.delete(key).await?;
                tracing::info!(key = %key, "Deleted unaccounted object");
            }
        }

        Ok(unaccounted)
    }
}
