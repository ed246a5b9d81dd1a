//! Reconciliation audit for one container.
//!
//! Lists the container's actual objects, subtracts every name either
//! ledger knows, and prints the orphans one per line. Pass `--delete` to
//! remove them, subject to the non-production safety policy.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgPoolOptions;
use stowage_core::Config;
use stowage_db::{PgClaimedFileStore, PgPendingUploadStore};
use stowage_services::{Reconciler, SafetyPolicy};
use stowage_storage::build_bucket_set;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    stowage_api::telemetry::init_telemetry();

    let mut args = std::env::args().skip(1);
    let container = match args.next() {
        Some(name) if name != "--delete" => name,
        _ => bail!("usage: reconcile <container> [--delete]"),
    };
    let also_delete = match args.next().as_deref() {
        None => false,
        Some("--delete") => true,
        Some(other) => bail!("unknown argument '{other}'"),
    };

    let config = Config::from_env()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let pending = Arc::new(PgPendingUploadStore::new(pool.clone()));
    let claimed = Arc::new(PgClaimedFileStore::new(pool));
    let buckets = Arc::new(
        build_bucket_set(&config.containers, &config.scratch_dir)
            .context("Failed to build storage containers")?,
    );

    let policy = SafetyPolicy {
        non_production_containers: config.non_production_containers.clone(),
        production: config.production,
    };

    let reconciler = Reconciler::new(pending, claimed, buckets, policy);
    let unaccounted = reconciler.find_unaccounted(&container, also_delete).await?;

    for name in &unaccounted {
        println!("{name}");
    }
    tracing::info!(
        container = %container,
        unaccounted = unaccounted.len(),
        deleted = also_delete,
        "Reconciliation finished"
    );

    Ok(())
}
