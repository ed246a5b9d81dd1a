//! Ledger operation errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("a pending upload named '{0}' already exists for a different container")]
    DuplicateName(String),

    /// Empty names are rejected at write time on both ledgers.
    #[error("file name must not be empty")]
    EmptyFileName,
}
