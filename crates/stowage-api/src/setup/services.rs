//! Service wiring.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use stowage_core::{Config, UsageRegistry};
use stowage_db::{PgClaimedFileStore, PgPendingUploadStore};
use stowage_services::{ClaimService, CleanupService, ResizeService};
use stowage_storage::build_bucket_set;

use crate::state::AppState;
use crate::usage::StoredImage;

/// Build the stores, buckets, registry, and services, and start the
/// background sweep loops.
pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let pending: Arc<PgPendingUploadStore> = Arc::new(PgPendingUploadStore::new(pool.clone()));
    let claimed: Arc<PgClaimedFileStore> = Arc::new(PgClaimedFileStore::new(pool.clone()));

    let buckets = Arc::new(
        build_bucket_set(&config.containers, &config.scratch_dir)
            .context("Failed to build storage containers")?,
    );

    let mut registry = UsageRegistry::new();
    if let Some(name) = &config.image_container {
        let container = config.container(name)?.clone();
        registry.register_image(Arc::new(StoredImage::new(container)));
        tracing::info!(container = %name, kind = StoredImage::KIND, "Registered image kind");
    } else {
        tracing::warn!("IMAGE_CONTAINER not set; no image kind registered, claims of kind 'image' will be rejected");
    }
    let registry = Arc::new(registry);

    let resize = ResizeService::new(claimed.clone(), buckets.clone(), registry.clone());
    let claims = ClaimService::new(claimed.clone(), registry.clone(), resize.clone());
    let cleanup = CleanupService::new(
        pending.clone(),
        claimed.clone(),
        buckets.clone(),
        registry.clone(),
    );

    let _ = Arc::new(cleanup).start(config.cleanup_interval_seconds);
    let _ = Arc::new(resize).start(config.resize_sweep_interval_seconds);

    Ok(Arc::new(AppState {
        config: config.clone(),
        pool,
        pending,
        claimed,
        buckets,
        registry,
        claims,
    }))
}
