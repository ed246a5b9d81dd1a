//! Stowage database layer
//!
//! Repositories for the two ledgers: pending uploads (issued-but-unclaimed
//! authorizations) and claimed files (objects in active use). Services
//! depend on the store traits; the Postgres implementations here use
//! dynamic sqlx queries so builds never need a live database.

pub mod claimed;
pub mod error;
pub mod pending;

// Re-export commonly used types
pub use claimed::{ClaimedFileStore, PgClaimedFileStore};
pub use error::LedgerError;
pub use pending::{PendingUploadStore, PgPendingUploadStore};
