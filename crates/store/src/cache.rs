//! Read-through cache of individual records, owned by one backend instance.

use std::collections::HashMap;

use tokio::sync::RwLock;

use caseload_core::types::RecordId;

use crate::collection::{Collection, StoredRecord};

#[derive(Debug, Default)]
struct CollectionCache {
    /// Bumped by every committed write, delete or eviction.
    generation: u64,
    records: HashMap<RecordId, StoredRecord>,
}

/// Per-collection id → record cache.
///
/// Writers call [`commit`](Self::commit) / [`evict`](Self::evict) while still
/// holding the collection's write gate, so cache order matches file order.
/// Read misses load the file without the gate and only populate the cache
/// through [`fill`](Self::fill), which refuses the record if a write has
/// committed since the caller took its [`generation`](Self::generation).
#[derive(Debug, Default)]
pub struct RecordCache {
    entries: RwLock<HashMap<Collection, CollectionCache>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Option<StoredRecord> {
        let entries = self.entries.read().await;
        entries.get(&collection).and_then(|c| c.records.get(id)).cloned()
    }

    /// Current write generation of `collection`.
    pub async fn generation(&self, collection: Collection) -> u64 {
        let entries = self.entries.read().await;
        entries.get(&collection).map_or(0, |c| c.generation)
    }

    /// Store a record read from the file at `generation`. Returns `false`
    /// when a newer write has committed in the meantime.
    pub async fn fill(&self, record: StoredRecord, generation: u64) -> bool {
        let mut entries = self.entries.write().await;
        let cache = entries.entry(record.collection()).or_default();
        if cache.generation != generation {
            return false;
        }
        cache.records.insert(record.id().to_string(), record);
        true
    }

    /// Record a committed write.
    pub async fn commit(&self, record: StoredRecord) {
        let mut entries = self.entries.write().await;
        let cache = entries.entry(record.collection()).or_default();
        cache.generation += 1;
        cache.records.insert(record.id().to_string(), record);
    }

    /// Drop one record after a committed delete.
    pub async fn evict(&self, collection: Collection, id: &str) {
        let mut entries = self.entries.write().await;
        let cache = entries.entry(collection).or_default();
        cache.generation += 1;
        cache.records.remove(id);
    }

    /// Drop every record of one collection, e.g. after its file was replaced.
    pub async fn evict_collection(&self, collection: Collection) {
        let mut entries = self.entries.write().await;
        let cache = entries.entry(collection).or_default();
        cache.generation += 1;
        cache.records.clear();
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        for collection in Collection::ALL {
            let cache = entries.entry(collection).or_default();
            cache.generation += 1;
            cache.records.clear();
        }
    }
}
