#![allow(dead_code)]

use std::time::Duration;

use chrono::{NaiveDate, Utc};

use caseload_core::stakeholders::StakeholderRole;
use caseload_core::types::new_record_id;
use caseload_store::lock::LockPolicy;
use caseload_store::models::{Client, Stakeholder};
use caseload_store::{JsonFileStore, StorageBackend};

/// Lock policy with short backoff so timeout tests stay fast.
pub fn fast_policy() -> LockPolicy {
    LockPolicy {
        retries: 3,
        backoff: Duration::from_millis(5),
        stale_after: Duration::from_secs(60),
    }
}

/// An initialized JSON store rooted in a fresh temp directory.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub async fn json_store() -> (tempfile::TempDir, JsonFileStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path(), fast_policy());
    store.initialize().await.unwrap();
    (dir, store)
}

pub fn client(name: &str) -> Client {
    let now = Utc::now();
    Client {
        id: new_record_id(),
        name: name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        ndis_number: None,
        primary_contact: None,
        emergency_contact: None,
        notes: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn stakeholder(name: &str, role: StakeholderRole) -> Stakeholder {
    let now = Utc::now();
    Stakeholder {
        id: new_record_id(),
        name: name.to_string(),
        role,
        email: None,
        phone: None,
        organization: None,
        notes: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}
