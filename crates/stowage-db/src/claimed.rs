//! Claimed file ledger
//!
//! Single table for every kind; `kind` selects the registered usage and
//! `payload` carries the kind-specific fields. Sweep queries order by
//! `created_at, id` so batch runs are deterministic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stowage_core::{ClaimedFile, NewClaimedFile};
use uuid::Uuid;

use crate::error::LedgerError;

/// Store seam for claimed files.
#[async_trait]
pub trait ClaimedFileStore: Send + Sync {
    /// Persist a new claim. Write-time enforcement of non-empty names
    /// lives here, not only in the schema.
    async fn insert(&self, new: NewClaimedFile) -> Result<ClaimedFile, LedgerError>;

    async fn get(&self, id: Uuid) -> Result<Option<ClaimedFile>, LedgerError>;

    /// All records carrying this file name, any kind. Container matching
    /// is the caller's job since containers live on the registered usage.
    async fn find_by_name(&self, file_name: &str) -> Result<Vec<ClaimedFile>, LedgerError>;

    /// Records whose retention window has lapsed: non-empty name and
    /// `retain_until` strictly before `now`. Rows with an empty name are
    /// schema corruption and are filtered out here.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ClaimedFile>, LedgerError>;

    /// Unprocessed records of one kind created at or after `created_after`,
    /// for the resize catch-up sweep.
    async fn list_unprocessed(
        &self,
        kind: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Vec<ClaimedFile>, LedgerError>;

    async fn set_retain_until(
        &self,
        id: Uuid,
        retain_until: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Stamp `processed_at`, at most once. Returns whether this call won
    /// the stamp; a record already stamped stays untouched, which keeps
    /// the field monotonic under concurrent resize triggers.
    async fn mark_processed(
        &self,
        id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, LedgerError>;

    async fn delete(&self, id: Uuid) -> Result<(), LedgerError>;

    /// Every claimed file name across all kinds, for the reconciler's
    /// known-name union.
    async fn list_names(&self) -> Result<Vec<String>, LedgerError>;
}

/// Postgres-backed claimed file ledger.
#[derive(Clone)]
pub struct PgClaimedFileStore {
    pool: PgPool,
}

impl PgClaimedFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClaimedFileStore for PgClaimedFileStore {
    async fn insert(&self, new: NewClaimedFile) -> Result<ClaimedFile, LedgerError> {
        if new.file_name.is_empty() {
            return Err(LedgerError::EmptyFileName);
        }

        let record = sqlx::query_as::<_, ClaimedFile>(
            r#"
            INSERT INTO claimed_files (id, file_name, kind, created_at, retain_until, processed_at, payload)
            VALUES ($1, $2, $3, $4, $5, NULL, $6)
            RETURNING id, file_name, kind, created_at, retain_until, processed_at, payload
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.file_name)
        .bind(&new.kind)
        .bind(Utc::now())
        .bind(new.retain_until)
        .bind(&new.payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ClaimedFile>, LedgerError> {
        let record = sqlx::query_as::<_, ClaimedFile>(
            r#"
            SELECT id, file_name, kind, created_at, retain_until, processed_at, payload
            FROM claimed_files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_name(&self, file_name: &str) -> Result<Vec<ClaimedFile>, LedgerError> {
        let records = sqlx::query_as::<_, ClaimedFile>(
            r#"
            SELECT id, file_name, kind, created_at, retain_until, processed_at, payload
            FROM claimed_files
            WHERE file_name = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(file_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ClaimedFile>, LedgerError> {
        let records = sqlx::query_as::<_, ClaimedFile>(
            r#"
            SELECT id, file_name, kind, created_at, retain_until, processed_at, payload
            FROM claimed_files
            WHERE file_name <> '' AND retain_until < $1
            ORDER BY created_at, id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_unprocessed(
        &self,
        kind: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Vec<ClaimedFile>, LedgerError> {
        let records = sqlx::query_as::<_, ClaimedFile>(
            r#"
            SELECT id, file_name, kind, created_at, retain_until, processed_at, payload
            FROM claimed_files
            WHERE kind = $1 AND processed_at IS NULL AND file_name <> '' AND created_at >= $2
            ORDER BY created_at, id
            "#,
        )
        .bind(kind)
        .bind(created_after)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn set_retain_until(
        &self,
        id: Uuid,
        retain_until: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        sqlx::query("UPDATE claimed_files SET retain_until = $2 WHERE id = $1")
            .bind(id)
            .bind(retain_until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_processed(
        &self,
        id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE claimed_files
            SET processed_at = $2
            WHERE id = $1 AND processed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(processed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<(), LedgerError> {
        sqlx::query("DELETE FROM claimed_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_names(&self) -> Result<Vec<String>, LedgerError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT file_name FROM claimed_files ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
