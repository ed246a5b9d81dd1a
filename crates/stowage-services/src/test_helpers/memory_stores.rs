//! In-memory implementations of the ledger store traits.
//!
//! These let service tests run without a database while keeping the same
//! query semantics as the Postgres stores, including the empty-name
//! filter and the deterministic `(created_at, id)` ordering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stowage_core::{ClaimedFile, NewClaimedFile, PendingUpload};
use stowage_db::{ClaimedFileStore, LedgerError, PendingUploadStore};
use uuid::Uuid;

/// Pending ledger backed by a hash map.
#[derive(Clone, Default)]
pub struct MemoryPendingStore {
    entries: Arc<Mutex<HashMap<Uuid, PendingUpload>>>,
}

impl MemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry with a chosen issue time, for backdating tests.
    pub fn add_entry(
        &self,
        file_name: &str,
        container_name: &str,
        issued_at: DateTime<Utc>,
    ) -> PendingUpload {
        let entry = PendingUpload {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            container_name: container_name.to_string(),
            issued_at,
        };
        self.entries.lock().unwrap().insert(entry.id, entry.clone());
        entry
    }

    pub fn has_name(&self, file_name: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .values()
            .any(|e| e.file_name == file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PendingUploadStore for MemoryPendingStore {
    async fn record_pending(
        &self,
        file_name: &str,
        container_name: &str,
    ) -> Result<PendingUpload, LedgerError> {
        if file_name.is_empty() {
            return Err(LedgerError::EmptyFileName);
        }

        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.values().find(|e| e.file_name == file_name) {
            if existing.container_name == container_name {
                return Ok(existing.clone());
            }
            return Err(LedgerError::DuplicateName(file_name.to_string()));
        }

        let entry = PendingUpload {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            container_name: container_name.to_string(),
            issued_at: Utc::now(),
        };
        entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_issued_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PendingUpload>, LedgerError> {
        let mut matching: Vec<PendingUpload> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.issued_at <= cutoff)
            .cloned()
            .collect();
        matching.sort_by_key(|e| (e.issued_at, e.id));
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> Result<(), LedgerError> {
        self.entries.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_names(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .map(|e| e.file_name.clone())
            .collect())
    }
}

/// Claimed ledger backed by a hash map.
#[derive(Clone, Default)]
pub struct MemoryClaimedStore {
    records: Arc<Mutex<HashMap<Uuid, ClaimedFile>>>,
}

impl MemoryClaimedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully specified record, bypassing claim validation.
    pub fn add_record(&self, record: ClaimedFile) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn record(&self, id: Uuid) -> Option<ClaimedFile> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ClaimedFileStore for MemoryClaimedStore {
    async fn insert(&self, new: NewClaimedFile) -> Result<ClaimedFile, LedgerError> {
        if new.file_name.is_empty() {
            return Err(LedgerError::EmptyFileName);
        }

        let record = ClaimedFile {
            id: Uuid::new_v4(),
            file_name: new.file_name,
            kind: new.kind,
            created_at: Utc::now(),
            retain_until: new.retain_until,
            processed_at: None,
            payload: new.payload,
        };
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ClaimedFile>, LedgerError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, file_name: &str) -> Result<Vec<ClaimedFile>, LedgerError> {
        let mut matching: Vec<ClaimedFile> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.file_name == file_name)
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.created_at, r.id));
        Ok(matching)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ClaimedFile>, LedgerError> {
        let mut matching: Vec<ClaimedFile> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.file_name.is_empty() && r.retention_elapsed(now))
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.created_at, r.id));
        Ok(matching)
    }

    async fn list_unprocessed(
        &self,
        kind: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Vec<ClaimedFile>, LedgerError> {
        let mut matching: Vec<ClaimedFile> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                r.kind == kind
                    && r.processed_at.is_none()
                    && !r.file_name.is_empty()
                    && r.created_at >= created_after
            })
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.created_at, r.id));
        Ok(matching)
    }

    async fn set_retain_until(
        &self,
        id: Uuid,
        retain_until: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            record.retain_until = Some(retain_until);
        }
        Ok(())
    }

    async fn mark_processed(
        &self,
        id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) if record.processed_at.is_none() => {
                record.processed_at = Some(processed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), LedgerError> {
        self.records.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_names(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .map(|r| r.file_name.clone())
            .collect())
    }
}
