//! Lifecycle services
//!
//! Claim handling, the two garbage-collection sweeps, the resize pipeline
//! and the reconciliation audit. Services receive their stores, buckets
//! and usage registry at construction; nothing in this crate reads
//! process-wide configuration.

pub mod claim;
pub mod cleanup;
pub mod reconcile;
pub mod resize;
pub mod test_helpers;

pub use claim::{ClaimError, ClaimService};
pub use cleanup::{CleanupError, CleanupService, RetentionSweepOutcome, GRACE_PERIOD_HOURS};
pub use reconcile::{ReconcileError, Reconciler, SafetyPolicy};
pub use resize::{ResizeError, ResizeOutcome, ResizeService, CATCH_UP_WINDOW_DAYS};
