use std::sync::Arc;

use stowage_core::{ClaimedFile, NewClaimedFile, UsageRegistry};
use stowage_db::{ClaimedFileStore, LedgerError};
use thiserror::Error;

use crate::resize::ResizeService;

#[derive(Debug, Error)]
pub enum ClaimError {
    /// Claims are only accepted for kinds with a registered usage.
    #[error("no usage registered for kind '{0}'")]
    UnknownKind(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Turns an uploaded-but-unowned object into a claimed file.
#[derive(Clone)]
pub struct ClaimService {
    claimed: Arc<dyn ClaimedFileStore>,
    registry: Arc<UsageRegistry>,
    resize: ResizeService,
}

impl ClaimService {
    pub fn new(
        claimed: Arc<dyn ClaimedFileStore>,
        registry: Arc<UsageRegistry>,
        resize: ResizeService,
    ) -> Self {
        Self {
            claimed,
            registry,
            resize,
        }
    }

    /// Persist a claim and, for image kinds, fire the immediate resize
    /// task.
    ///
    /// The matching pending entry is left alone; the never-claimed sweep
    /// drops resolved entries on its next run.
    #[tracing::instrument(skip(self, new), fields(file_name = %new.file_name, kind = %new.kind))]
    pub async fn claim(&self, new: NewClaimedFile) -> Result<ClaimedFile, ClaimError> {
        if self.registry.file_usage(&new.kind).is_none() {
            return Err(ClaimError::UnknownKind(new.kind));
        }

        let record = self.claimed.insert(new).await?;
        tracing::info!(record_id = %record.id, "Recorded claim");

        if self.registry.is_image_kind(&record.kind) {
            self.resize.dispatch(record.id);
        }

        Ok(record)
    }
}
