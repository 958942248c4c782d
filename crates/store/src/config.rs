use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::lock::LockPolicy;

/// Which storage backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    /// One JSON file per collection under `data_dir`.
    Json,
    /// Process-local, non-durable. Used for tests and demos.
    Memory,
}

impl FromStr for StorageBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "file" => Ok(Self::Json),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "Unknown storage backend '{other}'. Must be one of: json, memory"
            )),
        }
    }
}

/// Storage configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StorageBackendKind,
    /// Base directory for collection files and `backups/`.
    pub data_dir: PathBuf,
    /// Lock attempts before giving up with a lock timeout.
    pub lock_retries: u32,
    /// Linear backoff step between lock attempts (attempt × step).
    pub lock_backoff_ms: u64,
    /// Age after which a lock file is treated as abandoned.
    pub stale_lock_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Json,
            data_dir: PathBuf::from("./data"),
            lock_retries: 5,
            lock_backoff_ms: 50,
            stale_lock_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default  |
    /// |-------------------------|----------|
    /// | `STORAGE_BACKEND`       | `json`   |
    /// | `DATA_DIR`              | `./data` |
    /// | `STORE_LOCK_RETRIES`    | `5`      |
    /// | `STORE_LOCK_BACKOFF_MS` | `50`     |
    /// | `STORE_STALE_LOCK_SECS` | `10`     |
    ///
    /// Panics on malformed values: misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend = std::env::var("STORAGE_BACKEND")
            .map(|v| v.parse().unwrap_or_else(|e: String| panic!("{e}")))
            .unwrap_or(defaults.backend);

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let lock_retries: u32 = std::env::var("STORE_LOCK_RETRIES")
            .unwrap_or_else(|_| defaults.lock_retries.to_string())
            .parse()
            .expect("STORE_LOCK_RETRIES must be a valid u32");

        let lock_backoff_ms: u64 = std::env::var("STORE_LOCK_BACKOFF_MS")
            .unwrap_or_else(|_| defaults.lock_backoff_ms.to_string())
            .parse()
            .expect("STORE_LOCK_BACKOFF_MS must be a valid u64");

        let stale_lock_secs: u64 = std::env::var("STORE_STALE_LOCK_SECS")
            .unwrap_or_else(|_| defaults.stale_lock_secs.to_string())
            .parse()
            .expect("STORE_STALE_LOCK_SECS must be a valid u64");

        Self {
            backend,
            data_dir,
            lock_retries,
            lock_backoff_ms,
            stale_lock_secs,
        }
    }

    /// JSON backend rooted at `data_dir`, other settings default.
    pub fn json(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// In-memory backend.
    pub fn memory() -> Self {
        Self {
            backend: StorageBackendKind::Memory,
            ..Self::default()
        }
    }

    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            retries: self.lock_retries.max(1),
            backoff: Duration::from_millis(self.lock_backoff_ms),
            stale_after: Duration::from_secs(self.stale_lock_secs),
        }
    }
}
