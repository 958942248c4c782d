//! Typed facade over a [`StorageBackend`].

use std::sync::Arc;

use crate::backend::{open_backend, StorageBackend, StoreStats};
use crate::collection::{Record, StoredRecord};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::query::{ListOptions, RecordFilter};

/// Cheaply cloneable handle shared by every service.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.kind())
            .finish()
    }
}

impl Store {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Build the configured backend and initialize it.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let backend = open_backend(config);
        backend.initialize().await?;
        Ok(Self { backend })
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.backend
            .read(T::COLLECTION, id)
            .await?
            .map(T::from_stored)
            .transpose()
    }

    /// Upsert `record` and hand it back.
    pub async fn put<T: Record>(&self, record: T) -> Result<T, StoreError> {
        self.backend.write(record.clone().into_stored()).await?;
        Ok(record)
    }

    pub async fn remove<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
        self.backend.delete(T::COLLECTION, id).await
    }

    pub async fn exists<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
        self.backend.exists(T::COLLECTION, id).await
    }

    pub async fn list<T: Record>(
        &self,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<T>, StoreError> {
        self.backend
            .list(T::COLLECTION, filter, options)
            .await?
            .into_iter()
            .map(T::from_stored)
            .collect()
    }

    /// Every record in `T`'s collection, in stored order.
    pub async fn all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        self.list(&RecordFilter::new(), &ListOptions::default()).await
    }

    pub async fn count<T: Record>(&self, filter: &RecordFilter) -> Result<usize, StoreError> {
        self.backend.count(T::COLLECTION, filter).await
    }

    pub async fn find<T, F>(&self, predicate: F, options: &ListOptions) -> Result<Vec<T>, StoreError>
    where
        T: Record,
        F: Fn(&T) -> bool + Send + Sync,
    {
        let matches = |record: &StoredRecord| T::from_stored_ref(record).is_some_and(&predicate);
        self.backend
            .find(T::COLLECTION, &matches, options)
            .await?
            .into_iter()
            .map(T::from_stored)
            .collect()
    }

    pub async fn create_backup(&self) -> Result<String, StoreError> {
        self.backend.create_backup().await
    }

    pub async fn list_backups(&self) -> Result<Vec<String>, StoreError> {
        self.backend.list_backups().await
    }

    pub async fn restore_backup(&self, backup_id: &str) -> Result<(), StoreError> {
        self.backend.restore_backup(backup_id).await
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.backend.stats().await
    }

    pub async fn close(&self) -> Result<(), StoreError> {
        self.backend.close().await
    }
}
