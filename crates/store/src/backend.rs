//! The storage backend contract and backend selection.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::collection::{Collection, StoredRecord};
use crate::config::{StorageBackendKind, StoreConfig};
use crate::error::StoreError;
use crate::json_store::JsonFileStore;
use crate::memory_store::MemoryStore;
use crate::query::{ListOptions, RecordFilter};

/// General record predicate for [`StorageBackend::find`].
pub type RecordPredicate<'a> = dyn Fn(&StoredRecord) -> bool + Send + Sync + 'a;

/// Record counts across every collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_records: usize,
    pub records_by_collection: BTreeMap<Collection, usize>,
}

impl StoreStats {
    pub(crate) fn from_counts(counts: impl IntoIterator<Item = (Collection, usize)>) -> Self {
        let records_by_collection: BTreeMap<_, _> = counts.into_iter().collect();
        Self {
            total_records: records_by_collection.values().sum(),
            records_by_collection,
        }
    }
}

/// Durable, concurrency-safe persistence of the fixed set of collections.
///
/// Every operation other than [`initialize`](Self::initialize) fails with
/// [`StoreError::Uninitialized`] until `initialize` succeeds, and again after
/// [`close`](Self::close).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> StorageBackendKind;

    /// Idempotent setup: every collection exists, initially empty.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Fetch one record. A missing id is `Ok(None)`, never an error.
    async fn read(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredRecord>, StoreError>;

    /// Upsert by id, atomically with respect to other writers of the collection.
    async fn write(&self, record: StoredRecord) -> Result<(), StoreError>;

    /// Hard delete; returns whether the record existed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    /// Exact-match filtering followed by sorting and pagination.
    async fn list(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    async fn count(&self, collection: Collection, filter: &RecordFilter)
        -> Result<usize, StoreError>;

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    /// Predicate filtering with the same sort/pagination semantics as `list`.
    async fn find(
        &self,
        collection: Collection,
        predicate: &RecordPredicate<'_>,
        options: &ListOptions,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    /// Snapshot every collection; returns the backup identifier.
    async fn create_backup(&self) -> Result<String, StoreError>;

    /// Known backup identifiers, newest first.
    async fn list_backups(&self) -> Result<Vec<String>, StoreError>;

    /// Replace every collection with the named snapshot and drop cached records.
    async fn restore_backup(&self, backup_id: &str) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Release in-memory resources. Re-`initialize` before further use.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Construct the configured backend. It still needs [`StorageBackend::initialize`].
pub fn open_backend(config: &StoreConfig) -> Arc<dyn StorageBackend> {
    match config.backend {
        StorageBackendKind::Json => Arc::new(JsonFileStore::new(
            config.data_dir.clone(),
            config.lock_policy(),
        )),
        StorageBackendKind::Memory => Arc::new(MemoryStore::new()),
    }
}

// ---------------------------------------------------------------------------
// Backup identifiers
// ---------------------------------------------------------------------------

pub(crate) const BACKUP_PREFIX: &str = "backup-";

/// `backup-<YYYYMMDDTHHMMSS.fffZ>`, optionally suffixed `-<n>` on collision.
pub(crate) fn new_backup_id(attempt: u32) -> String {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    if attempt == 0 {
        format!("{BACKUP_PREFIX}{stamp}")
    } else {
        format!("{BACKUP_PREFIX}{stamp}-{attempt}")
    }
}

/// Reject anything that could escape the backups directory.
pub(crate) fn validate_backup_id(backup_id: &str) -> Result<(), StoreError> {
    let well_formed = backup_id.starts_with(BACKUP_PREFIX)
        && backup_id.len() > BACKUP_PREFIX.len()
        && !backup_id.contains("..")
        && backup_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if well_formed {
        Ok(())
    } else {
        Err(StoreError::InvalidBackupId(backup_id.to_string()))
    }
}
