//! Advisory per-collection file lock.
//!
//! The lock is a sibling `<collection>.json.lock` file created with
//! `create_new`, so acquisition is atomic across processes. The file holds an
//! owner token; the guard removes the file on drop while it still holds that
//! token, which releases the lock on every exit path.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::io::AsyncWriteExt;

use crate::collection::Collection;
use crate::error::StoreError;

/// Bounded retry policy for lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPolicy {
    /// Total attempts before failing with [`StoreError::LockTimeout`].
    pub retries: u32,
    /// Linear backoff step: attempt `n` waits `n × backoff` before retrying.
    pub backoff: Duration,
    /// A lock file older than this is assumed abandoned and removed.
    pub stale_after: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff: Duration::from_millis(50),
            stale_after: Duration::from_secs(10),
        }
    }
}

impl LockPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Held lock on one collection file. Dropping it releases the lock.
#[derive(Debug)]
pub struct FileLockGuard {
    path: PathBuf,
    token: String,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        // A lock reclaimed as stale by another process is no longer ours.
        match std::fs::read_to_string(&self.path) {
            Ok(owner) if owner == self.token => {}
            Ok(_) => {
                tracing::warn!("Collection lock was taken over; leaving it in place");
                return;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to inspect collection lock");
                return;
            }
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(error = %e, "Failed to release collection lock");
            }
        }
    }
}

/// Lock file path for a collection file.
pub fn lock_path_for(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Acquire the lock at `lock_path`, retrying with backoff.
///
/// Never blocks indefinitely: after `policy.retries` failed attempts the call
/// fails with [`StoreError::LockTimeout`]. Reclaiming a stale lock does not
/// use up an attempt.
pub async fn acquire(
    lock_path: &Path,
    collection: Collection,
    policy: &LockPolicy,
) -> Result<FileLockGuard, StoreError> {
    let token = format!("{}:{}", std::process::id(), uuid::Uuid::new_v4());
    let mut failures = 0;
    let mut reclaims = 0;

    while failures < policy.retries {
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
            .await
        {
            Ok(mut file) => {
                let written: std::io::Result<()> = async {
                    file.write_all(token.as_bytes()).await?;
                    file.flush().await
                }
                .await;
                if let Err(e) = written {
                    let _ = tokio::fs::remove_file(lock_path).await;
                    return Err(StoreError::io(format!("locking '{collection}'"), e));
                }
                tracing::debug!(%collection, failures, "Acquired collection lock");
                return Ok(FileLockGuard {
                    path: lock_path.to_path_buf(),
                    token,
                });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if reclaims < policy.retries && reclaim_if_stale(lock_path, policy.stale_after).await
                {
                    reclaims += 1;
                    tracing::warn!(%collection, "Removed stale collection lock");
                    continue;
                }
                failures += 1;
                if failures < policy.retries {
                    tracing::warn!(%collection, attempt = failures, "Collection lock busy, retrying");
                    tokio::time::sleep(policy.delay_for_attempt(failures)).await;
                }
            }
            Err(e) => {
                return Err(StoreError::io(format!("locking '{collection}'"), e));
            }
        }
    }

    Err(StoreError::LockTimeout {
        collection,
        attempts: policy.retries,
    })
}

/// Remove the lock at `lock_path` if it is older than `stale_after`.
///
/// The owner token is read when judging staleness and again right before
/// removal; a lock re-created in between by another process is left alone.
async fn reclaim_if_stale(lock_path: &Path, stale_after: Duration) -> bool {
    let Ok(judged) = tokio::fs::read(lock_path).await else {
        return false;
    };
    if !is_stale(lock_path, stale_after).await {
        return false;
    }
    match tokio::fs::read(lock_path).await {
        Ok(current) if current == judged => {}
        _ => return false,
    }
    match tokio::fs::remove_file(lock_path).await {
        Ok(()) => true,
        Err(e) => e.kind() == ErrorKind::NotFound,
    }
}

async fn is_stale(lock_path: &Path, stale_after: Duration) -> bool {
    let Ok(metadata) = tokio::fs::metadata(lock_path).await else {
        return false;
    };
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > stale_after)
}
