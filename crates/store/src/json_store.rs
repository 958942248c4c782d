//! JSON file backend: one envelope file per collection under `data_dir`.
//!
//! Writes run a locked read-modify-write cycle against the file itself and
//! replace it atomically (temp file, fsync, rename). Point reads are served
//! from the record cache once populated; list-style reads always re-read the
//! file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::backend::{
    new_backup_id, validate_backup_id, RecordPredicate, StorageBackend, StoreStats,
};
use crate::cache::RecordCache;
use crate::collection::{Collection, StoredRecord};
use crate::config::StorageBackendKind;
use crate::envelope::Envelope;
use crate::error::{describe_serde_error, StoreError};
use crate::lock::{self, LockPolicy};
use crate::query::{apply_options, ListOptions, RecordFilter};

const BACKUPS_DIR: &str = "backups";

/// In-process write queue, one per collection.
///
/// Same-process writers wait here so the bounded file-lock retries only ever
/// contend with other processes.
#[derive(Debug, Default)]
struct WriteGates {
    clients: Mutex<()>,
    goals: Mutex<()>,
    activities: Mutex<()>,
    shift_notes: Mutex<()>,
    stakeholders: Mutex<()>,
}

impl WriteGates {
    fn get(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::Clients => &self.clients,
            Collection::Goals => &self.goals,
            Collection::Activities => &self.activities,
            Collection::ShiftNotes => &self.shift_notes,
            Collection::Stakeholders => &self.stakeholders,
        }
    }
}

/// Cache change applied once a locked write has committed.
enum CacheUpdate<'a> {
    Commit(StoredRecord),
    Evict(&'a str),
}

pub struct JsonFileStore {
    data_dir: PathBuf,
    policy: LockPolicy,
    cache: RecordCache,
    gates: WriteGates,
    initialized: AtomicBool,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>, policy: LockPolicy) -> Self {
        Self {
            data_dir: data_dir.into(),
            policy,
            cache: RecordCache::new(),
            gates: WriteGates::default(),
            initialized: AtomicBool::new(false),
        }
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }

    fn backups_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUPS_DIR)
    }

    fn ensure_initialized(&self) -> Result<(), StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Uninitialized)
        }
    }

    // -- file primitives -----------------------------------------------------

    /// Read a collection file. A missing file reads as an empty collection.
    async fn load_envelope(&self, collection: Collection) -> Result<Envelope, StoreError> {
        read_envelope_file(&self.collection_path(collection), collection).await
    }

    /// Locked read-modify-write. `mutate` returns whether the envelope changed;
    /// unchanged envelopes are not rewritten. The cache is updated before the
    /// gate and lock are released.
    async fn mutate<F>(
        &self,
        collection: Collection,
        update: CacheUpdate<'_>,
        mutate: F,
    ) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Envelope) -> Result<bool, StoreError> + Send,
    {
        let path = self.collection_path(collection);
        let _gate = self.gates.get(collection).lock().await;
        let _lock = lock::acquire(&lock::lock_path_for(&path), collection, &self.policy).await?;

        let mut envelope = read_envelope_file(&path, collection).await?;
        let changed = mutate(&mut envelope)?;
        if changed {
            let bytes = envelope.to_bytes()?;
            atomic_write(&path, &bytes, collection).await?;
        }
        match update {
            CacheUpdate::Commit(record) => self.cache.commit(record).await,
            CacheUpdate::Evict(id) => self.cache.evict(collection, id).await,
        }
        Ok(changed)
    }

    /// Overwrite a collection under its lock without reading the current file,
    /// so a corrupt file can still be replaced.
    async fn replace(&self, collection: Collection, envelope: &mut Envelope) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let _gate = self.gates.get(collection).lock().await;
        let _lock = lock::acquire(&lock::lock_path_for(&path), collection, &self.policy).await?;
        let bytes = envelope.to_bytes()?;
        atomic_write(&path, &bytes, collection).await?;
        self.cache.evict_collection(collection).await;
        Ok(())
    }

    fn decode_all(
        collection: Collection,
        envelope: Envelope,
    ) -> Result<Vec<(serde_json::Value, StoredRecord)>, StoreError> {
        envelope
            .records
            .into_iter()
            .map(|value| {
                let record = decode(collection, value.clone())?;
                Ok((value, record))
            })
            .collect()
    }
}

fn decode(collection: Collection, value: serde_json::Value) -> Result<StoredRecord, StoreError> {
    StoredRecord::from_value(collection, value).map_err(|e| StoreError::Corrupt {
        collection,
        reason: describe_serde_error(&e),
    })
}

async fn read_envelope_file(path: &Path, collection: Collection) -> Result<Envelope, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Envelope::parse(collection, &bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Envelope::empty()),
        Err(e) => Err(StoreError::io(format!("reading '{collection}'"), e)),
    }
}

/// Write `bytes` to a sibling temp file, fsync it and rename it over `path`.
///
/// Readers observe either the previous or the new complete file.
async fn atomic_write(path: &Path, bytes: &[u8], collection: Collection) -> Result<(), StoreError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
    let tmp_path = PathBuf::from(tmp_name);

    let result: std::io::Result<()> = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(StoreError::io(format!("writing '{collection}'"), e));
    }
    Ok(())
}

#[async_trait]
impl StorageBackend for JsonFileStore {
    fn kind(&self) -> StorageBackendKind {
        StorageBackendKind::Json
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::io("creating the data directory", e))?;
        tokio::fs::create_dir_all(self.backups_dir())
            .await
            .map_err(|e| StoreError::io("creating the backups directory", e))?;

        for collection in Collection::ALL {
            let path = self.collection_path(collection);
            let _gate = self.gates.get(collection).lock().await;
            let _lock =
                lock::acquire(&lock::lock_path_for(&path), collection, &self.policy).await?;

            match tokio::fs::metadata(&path).await {
                Ok(_) => {
                    // Fail startup on an unreadable file rather than on first use.
                    read_envelope_file(&path, collection).await?;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    let bytes = Envelope::empty().to_bytes()?;
                    atomic_write(&path, &bytes, collection).await?;
                    tracing::debug!(%collection, "Created empty collection file");
                }
                Err(e) => return Err(StoreError::io(format!("inspecting '{collection}'"), e)),
            }
        }

        self.initialized.store(true, Ordering::Release);
        tracing::info!(backend = "json", "Storage initialized");
        Ok(())
    }

    async fn read(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.ensure_initialized()?;

        if let Some(hit) = self.cache.get(collection, id).await {
            tracing::debug!(%collection, id, "Cache hit");
            return Ok(Some(hit));
        }

        let generation = self.cache.generation(collection).await;
        let mut envelope = self.load_envelope(collection).await?;
        let Some(idx) = envelope.position(id) else {
            return Ok(None);
        };
        let record = decode(collection, envelope.records.swap_remove(idx))?;
        if !self.cache.fill(record.clone(), generation).await {
            tracing::debug!(%collection, id, "Read superseded by a write; not cached");
        }
        Ok(Some(record))
    }

    async fn write(&self, record: StoredRecord) -> Result<(), StoreError> {
        self.ensure_initialized()?;

        let collection = record.collection();
        let value = record.to_value()?;
        self.mutate(collection, CacheUpdate::Commit(record), move |envelope| {
            envelope.upsert(value);
            Ok(true)
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        self.ensure_initialized()?;

        self.mutate(collection, CacheUpdate::Evict(id), |envelope| {
            Ok(envelope.remove(id))
        })
        .await
    }

    async fn list(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.ensure_initialized()?;

        let envelope = self.load_envelope(collection).await?;
        let matched = envelope
            .records
            .into_iter()
            .filter(|value| filter.matches(value))
            .map(|value| {
                let record = decode(collection, value.clone())?;
                Ok((value, record))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(apply_options(matched, options))
    }

    async fn count(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<usize, StoreError> {
        self.ensure_initialized()?;

        let envelope = self.load_envelope(collection).await?;
        Ok(envelope.records.iter().filter(|v| filter.matches(v)).count())
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

        let envelope = self.load_envelope(collection).await?;
        let matched = Self::decode_all(collection, envelope)?
            .into_iter()
            .filter(|(_, record)| predicate(record))
            .collect();
        Ok(apply_options(matched, options))
    }

    async fn create_backup(&self) -> Result<String, StoreError> {
        self.ensure_initialized()?;

        let backups_dir = self.backups_dir();
        tokio::fs::create_dir_all(&backups_dir)
            .await
            .map_err(|e| StoreError::io("creating the backups directory", e))?;

        let mut attempt = 0;
        let (backup_id, backup_dir) = loop {
            let id = new_backup_id(attempt);
            let dir = backups_dir.join(&id);
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => break (id, dir),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(StoreError::io("creating a backup", e)),
            }
        };

        // Collection files are only ever replaced by rename, so a plain read
        // always sees a complete envelope.
        for collection in Collection::ALL {
            let mut envelope = self.load_envelope(collection).await?;
            let bytes = envelope.to_bytes()?;
            atomic_write(&backup_dir.join(collection.file_name()), &bytes, collection).await?;
        }

        tracing::info!(backup_id = %backup_id, "Backup created");
        Ok(backup_id)
    }

    async fn list_backups(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_initialized()?;

        let mut entries = match tokio::fs::read_dir(self.backups_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("listing backups", e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io("listing backups", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if let Some(name) = entry.file_name().to_str() {
                if is_dir && validate_backup_id(name).is_ok() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    async fn restore_backup(&self, backup_id: &str) -> Result<(), StoreError> {
        self.ensure_initialized()?;
        validate_backup_id(backup_id)?;

        let backup_dir = self.backups_dir().join(backup_id);
        match tokio::fs::metadata(&backup_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::BackupNotFound(backup_id.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::BackupNotFound(backup_id.to_string()))
            }
            Err(e) => return Err(StoreError::io("opening a backup", e)),
        }

        // Validate every snapshot before replacing anything.
        let mut snapshots = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            let envelope =
                read_envelope_file(&backup_dir.join(collection.file_name()), collection).await?;
            Self::decode_all(collection, envelope.clone())?;
            snapshots.push((collection, envelope));
        }

        for (collection, mut snapshot) in snapshots {
            self.replace(collection, &mut snapshot).await?;
        }

        tracing::info!(backup_id, "Backup restored");
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.ensure_initialized()?;

        let mut counts = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            counts.push((collection, self.load_envelope(collection).await?.records.len()));
        }
        Ok(StoreStats::from_counts(counts))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.initialized.store(false, Ordering::Release);
        self.cache.clear().await;
        tracing::info!(backend = "json", "Storage closed");
        Ok(())
    }
}
