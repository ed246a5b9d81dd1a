//! In-memory store client that records every call it serves.
//!
//! Objects live in a hash map keyed by object key. Downloads and uploads
//! still move bytes through the local scratch path so tests exercise the
//! same file plumbing as the real backends.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use stowage_storage::{ObjectEntry, StoreClient, StoreError, StoreResult};

#[derive(Clone, Default)]
pub struct RecordingStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    downloads: Arc<Mutex<Vec<String>>>,
    uploads: Arc<Mutex<Vec<String>>>,
    deletes: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, standing in for a client-side signed-URL upload.
    pub fn set_object(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn download_count(&self, key: &str) -> usize {
        self.downloads
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }

    pub fn upload_count(&self, key: &str) -> usize {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreClient for RecordingStore {
    async fn list(&self) -> StoreResult<Vec<ObjectEntry>> {
        let keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        Ok(keys
            .into_iter()
            .map(|key| ObjectEntry {
                key,
                last_modified: Utc::now(),
            })
            .collect())
    }

    async fn download(&self, key: &str, local_path: &Path) -> StoreResult<()> {
        self.downloads.lock().unwrap().push(key.to_string());
        let data = self.objects.lock().unwrap().get(key).cloned();
        let data = data.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        tokio::fs::write(local_path, data).await?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StoreResult<()> {
        self.uploads.lock().unwrap().push(key.to_string());
        let data = tokio::fs::read(local_path).await?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().remove(key);
        Ok(true)
    }

    async fn signed_put_url(&self, key: &str, _expires_in: Duration) -> StoreResult<String> {
        Ok(format!("https://example.com/signed/{key}"))
    }
}
