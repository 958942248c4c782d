//! Process-local backend for tests and demos. Nothing survives the process.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{
    new_backup_id, validate_backup_id, RecordPredicate, StorageBackend, StoreStats,
};
use crate::collection::{Collection, StoredRecord};
use crate::config::StorageBackendKind;
use crate::error::StoreError;
use crate::query::{apply_options, ListOptions, RecordFilter};

type Snapshot = HashMap<Collection, Vec<StoredRecord>>;

/// In-memory implementation of [`StorageBackend`].
///
/// Collections keep insertion order like the file backend. A single write
/// lock serializes all mutations. `close` only flips the initialized flag;
/// records stay until the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Snapshot>,
    backups: RwLock<BTreeMap<String, Snapshot>>,
    initialized: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_initialized(&self) -> Result<(), StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Uninitialized)
        }
    }

    async fn snapshot_of(&self, collection: Collection) -> Vec<StoredRecord> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }
}

fn with_values(
    records: Vec<StoredRecord>,
) -> Result<Vec<(serde_json::Value, StoredRecord)>, StoreError> {
    records
        .into_iter()
        .map(|record| Ok((record.to_value()?, record)))
        .collect()
}

#[async_trait]
impl StorageBackend for MemoryStore {
    fn kind(&self) -> StorageBackendKind {
        StorageBackendKind::Memory
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        for collection in Collection::ALL {
            collections.entry(collection).or_default();
        }
        self.initialized.store(true, Ordering::Release);
        tracing::info!(backend = "memory", "Storage initialized");
        Ok(())
    }

    async fn read(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.ensure_initialized()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|records| records.iter().find(|r| r.id() == id))
            .cloned())
    }

    async fn write(&self, record: StoredRecord) -> Result<(), StoreError> {
        self.ensure_initialized()?;
        let mut collections = self.collections.write().await;
        let records = collections.entry(record.collection()).or_default();
        match records.iter().position(|r| r.id() == record.id()) {
            Some(idx) => records[idx] = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        self.ensure_initialized()?;
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        match records.iter().position(|r| r.id() == id) {
            Some(idx) => {
                records.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.ensure_initialized()?;
        let matched = with_values(self.snapshot_of(collection).await)?
            .into_iter()
            .filter(|(value, _)| filter.matches(value))
            .collect();
        Ok(apply_options(matched, options))
    }

    async fn count(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<usize, StoreError> {
        self.ensure_initialized()?;
        if filter.is_empty() {
            return Ok(self.snapshot_of(collection).await.len());
        }
        Ok(with_values(self.snapshot_of(collection).await)?
            .iter()
            .filter(|(value, _)| filter.matches(value))
            .count())
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        Ok(self.read(collection, id).await?.is_some())
    }

    async fn find(
        &self,
        collection: Collection,
        predicate: &RecordPredicate<'_>,
        options: &ListOptions,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.ensure_initialized()?;
        let matched: Vec<StoredRecord> = self
            .snapshot_of(collection)
            .await
            .into_iter()
            .filter(|r| predicate(r))
            .collect();
        Ok(apply_options(with_values(matched)?, options))
    }

    async fn create_backup(&self) -> Result<String, StoreError> {
        self.ensure_initialized()?;
        let snapshot = self.collections.read().await.clone();
        let mut backups = self.backups.write().await;

        let mut attempt = 0;
        let mut backup_id = new_backup_id(attempt);
        while backups.contains_key(&backup_id) {
            attempt += 1;
            backup_id = new_backup_id(attempt);
        }
        backups.insert(backup_id.clone(), snapshot);

        tracing::info!(backup_id = %backup_id, "Backup created");
        Ok(backup_id)
    }

    async fn list_backups(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_initialized()?;
        Ok(self.backups.read().await.keys().rev().cloned().collect())
    }

    async fn restore_backup(&self, backup_id: &str) -> Result<(), StoreError> {
        self.ensure_initialized()?;
        validate_backup_id(backup_id)?;

        let snapshot = self
            .backups
            .read()
            .await
            .get(backup_id)
            .cloned()
            .ok_or_else(|| StoreError::BackupNotFound(backup_id.to_string()))?;
        *self.collections.write().await = snapshot;

        tracing::info!(backup_id, "Backup restored");
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.ensure_initialized()?;
        let collections = self.collections.read().await;
        Ok(StoreStats::from_counts(Collection::ALL.map(|c| {
            (c, collections.get(&c).map_or(0, Vec::len))
        })))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.initialized.store(false, Ordering::Release);
        tracing::info!(backend = "memory", "Storage closed");
        Ok(())
    }
}
