//! Application state shared by the handlers.

use std::sync::Arc;

use sqlx::PgPool;
use stowage_core::{Config, UsageRegistry};
use stowage_db::{ClaimedFileStore, PendingUploadStore};
use stowage_services::ClaimService;
use stowage_storage::BucketSet;

/// Everything a handler can reach: configuration, the two ledgers, the
/// configured buckets, the usage registry, and the claim service. The
/// sweep services run as background loops and are not exposed here.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub pending: Arc<dyn PendingUploadStore>,
    pub claimed: Arc<dyn ClaimedFileStore>,
    pub buckets: Arc<BucketSet>,
    pub registry: Arc<UsageRegistry>,
    pub claims: ClaimService,
}
