//! Pending upload ledger
//!
//! One row per issued upload authorization. Rows exist only between
//! issuance and resolution: either a claimed file shows up for the same
//! name and container, or the never-claimed sweep reclaims them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stowage_core::PendingUpload;
use uuid::Uuid;

use crate::error::LedgerError;

/// Store seam for the pending ledger.
#[async_trait]
pub trait PendingUploadStore: Send + Sync {
    /// Record that an upload authorization was issued.
    ///
    /// Get-or-create: calling again with the same name and container
    /// returns the existing entry. A name already pending for a different
    /// container is `LedgerError::DuplicateName` (names are random and
    /// unguessable, so that collision is a caller bug).
    async fn record_pending(
        &self,
        file_name: &str,
        container_name: &str,
    ) -> Result<PendingUpload, LedgerError>;

    /// Entries issued at or before `cutoff`, oldest first.
    async fn list_issued_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PendingUpload>, LedgerError>;

    /// Remove a resolved or reclaimed entry.
    async fn delete(&self, id: Uuid) -> Result<(), LedgerError>;

    /// Every pending file name, for the reconciler's known-name union.
    async fn list_names(&self) -> Result<Vec<String>, LedgerError>;
}

/// Postgres-backed pending ledger.
#[derive(Clone)]
pub struct PgPendingUploadStore {
    pool: PgPool,
}

impl PgPendingUploadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingUploadStore for PgPendingUploadStore {
    async fn record_pending(
        &self,
        file_name: &str,
        container_name: &str,
    ) -> Result<PendingUpload, LedgerError> {
        if file_name.is_empty() {
            return Err(LedgerError::EmptyFileName);
        }

        // The no-op update makes the conflict arm return the existing row,
        // but only when the container matches; a name held by another
        // container yields no row at all.
        let entry = sqlx::query_as::<_, PendingUpload>(
            r#"
            INSERT INTO pending_uploads (id, file_name, container_name, issued_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (file_name) DO UPDATE
                SET file_name = EXCLUDED.file_name
                WHERE pending_uploads.container_name = EXCLUDED.container_name
            RETURNING id, file_name, container_name, issued_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(file_name)
        .bind(container_name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        entry.ok_or_else(|| LedgerError::DuplicateName(file_name.to_string()))
    }

    async fn list_issued_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PendingUpload>, LedgerError> {
        let entries = sqlx::query_as::<_, PendingUpload>(
            r#"
            SELECT id, file_name, container_name, issued_at
            FROM pending_uploads
            WHERE issued_at <= $1
            ORDER BY issued_at, id
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn delete(&self, id: Uuid) -> Result<(), LedgerError> {
        sqlx::query("DELETE FROM pending_uploads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_names(&self) -> Result<Vec<String>, LedgerError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT file_name FROM pending_uploads ORDER BY issued_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
