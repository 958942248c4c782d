//! Integration tests for the JSON file backend.
//!
//! Each test runs against its own temp directory and covers:
//! - Round-trip, upsert and delete semantics
//! - Serialization of concurrent writers (same instance and across instances)
//! - Lock timeout and stale-lock recovery
//! - Corrupt files surfacing as storage failures
//! - Backup, restore and statistics

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use futures::future::join_all;

use caseload_core::error::CoreError;
use caseload_core::stakeholders::StakeholderRole;
use caseload_store::lock::LockPolicy;
use caseload_store::models::{Client, Stakeholder};
use caseload_store::{
    Collection, JsonFileStore, ListOptions, RecordFilter, SortOrder, StorageBackend, Store,
    StoreError,
};

use common::{client, fast_policy, json_store, stakeholder};

fn facade(store: JsonFileStore) -> Store {
    Store::new(Arc::new(store))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_creates_empty_envelopes() {
    let (dir, _store) = json_store().await;

    for collection in Collection::ALL {
        let bytes = std::fs::read(dir.path().join(collection.file_name())).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], "1.0");
        assert!(value["last_updated"].is_string());
        assert_eq!(value["records"], serde_json::json!([]));
    }
    assert!(dir.path().join("backups").is_dir());
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let (dir, store) = json_store().await;
    let store = facade(store);
    store.put(client("Avery")).await.unwrap();

    let again = JsonFileStore::new(dir.path(), fast_policy());
    again.initialize().await.unwrap();
    again.initialize().await.unwrap();
    assert_eq!(again.count(Collection::Clients, &RecordFilter::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn operations_before_initialize_fail() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path(), fast_policy());

    assert_matches!(
        store.read(Collection::Clients, "x").await,
        Err(StoreError::Uninitialized)
    );
    assert_matches!(
        store.write(client("Avery").into()).await,
        Err(StoreError::Uninitialized)
    );
    assert_matches!(store.stats().await, Err(StoreError::Uninitialized));
}

#[tokio::test]
async fn close_requires_reinitialize() {
    let (_dir, store) = json_store().await;
    store.close().await.unwrap();
    assert_matches!(
        store.count(Collection::Goals, &RecordFilter::new()).await,
        Err(StoreError::Uninitialized)
    );

    store.initialize().await.unwrap();
    assert_eq!(store.count(Collection::Goals, &RecordFilter::new()).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Read / write / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn written_record_reads_back_equal() {
    let (dir, store) = json_store().await;
    let store = facade(store);
    let avery = client("Avery");
    store.put(avery.clone()).await.unwrap();

    assert_eq!(store.get::<Client>(&avery.id).await.unwrap(), Some(avery.clone()));

    // A fresh instance has no cache and must decode the file.
    let cold = JsonFileStore::new(dir.path(), fast_policy());
    cold.initialize().await.unwrap();
    let cold = facade(cold);
    assert_eq!(cold.get::<Client>(&avery.id).await.unwrap(), Some(avery));
}

#[tokio::test]
async fn missing_id_reads_as_none() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    assert_eq!(store.get::<Client>("no-such-id").await.unwrap(), None);
    assert!(!store.exists::<Client>("no-such-id").await.unwrap());
}

#[tokio::test]
async fn upsert_replaces_without_growing() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    let mut avery = client("Avery");
    store.put(avery.clone()).await.unwrap();

    avery.notes = Some("second write".into());
    store.put(avery.clone()).await.unwrap();

    assert_eq!(store.count::<Client>(&RecordFilter::new()).await.unwrap(), 1);
    let all = store.all::<Client>().await.unwrap();
    assert_eq!(all, vec![avery]);
}

#[tokio::test]
async fn replacing_keeps_insertion_position() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    let mut first = client("First");
    let second = client("Second");
    store.put(first.clone()).await.unwrap();
    store.put(second.clone()).await.unwrap();

    first.notes = Some("edited".into());
    store.put(first.clone()).await.unwrap();

    let ids: Vec<_> = store.all::<Client>().await.unwrap().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn delete_reports_existence_once() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    let avery = client("Avery");
    store.put(avery.clone()).await.unwrap();

    assert!(store.remove::<Client>(&avery.id).await.unwrap());
    assert!(!store.remove::<Client>(&avery.id).await.unwrap());
    assert!(!store.remove::<Client>("never-written").await.unwrap());
    assert_eq!(store.get::<Client>(&avery.id).await.unwrap(), None);
}

#[tokio::test]
async fn writes_leave_no_temp_or_lock_files() {
    let (dir, store) = json_store().await;
    let store = facade(store);
    for i in 0..5 {
        store.put(client(&format!("Client {i}"))).await.unwrap();
    }

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp") || name.ends_with(".lock"))
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_writers_lose_no_updates() {
    let (_dir, store) = json_store().await;
    let store = facade(store);

    let writes = (0..25).map(|i| {
        let store = store.clone();
        async move { store.put(client(&format!("Client {i}"))).await }
    });
    for result in join_all(writes).await {
        result.unwrap();
    }

    assert_eq!(store.count::<Client>(&RecordFilter::new()).await.unwrap(), 25);
}

#[tokio::test]
async fn writers_in_separate_instances_serialize_on_the_file_lock() {
    let dir = tempfile::tempdir().unwrap();
    let patient = LockPolicy {
        retries: 200,
        backoff: Duration::from_millis(2),
        stale_after: Duration::from_secs(60),
    };
    let a = JsonFileStore::new(dir.path(), patient.clone());
    let b = JsonFileStore::new(dir.path(), patient);
    a.initialize().await.unwrap();
    b.initialize().await.unwrap();
    let (a, b) = (facade(a), facade(b));

    let writes = (0..20).map(|i| {
        let store = if i % 2 == 0 { a.clone() } else { b.clone() };
        tokio::spawn(async move { store.put(client(&format!("Client {i}"))).await })
    });
    for handle in join_all(writes).await {
        handle.unwrap().unwrap();
    }

    assert_eq!(a.count::<Client>(&RecordFilter::new()).await.unwrap(), 20);
}

#[tokio::test]
async fn held_lock_times_out_as_storage_failure() {
    let (dir, store) = json_store().await;
    std::fs::write(dir.path().join("clients.json.lock"), b"1").unwrap();

    let err = store.write(client("Avery").into()).await.unwrap_err();
    assert_matches!(
        err,
        StoreError::LockTimeout { collection: Collection::Clients, attempts: 3 }
    );

    let core: CoreError = err.into();
    assert_eq!(core.code(), "STORAGE_ERROR");
    assert!(core.is_transient());

    // Other collections are unaffected.
    store
        .write(stakeholder("Sam", StakeholderRole::SupportWorker).into())
        .await
        .unwrap();
}

#[tokio::test]
async fn stale_lock_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(
        dir.path(),
        LockPolicy {
            stale_after: Duration::ZERO,
            ..fast_policy()
        },
    );
    store.initialize().await.unwrap();
    std::fs::write(dir.path().join("clients.json.lock"), b"12345").unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    store.write(client("Avery").into()).await.unwrap();
    assert!(!dir.path().join("clients.json.lock").exists());
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_filters_sorts_and_paginates() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    for name in ["Cam", "Ari", "Bo", "Dee"] {
        store.put(client(name)).await.unwrap();
    }
    let mut inactive = client("Eli");
    inactive.active = false;
    store.put(inactive).await.unwrap();

    let active = RecordFilter::new().eq("active", true);
    let names = |clients: Vec<Client>| clients.into_iter().map(|c| c.name).collect::<Vec<_>>();

    let asc = store
        .list::<Client>(&active, &ListOptions::sorted_by("name", SortOrder::Asc))
        .await
        .unwrap();
    assert_eq!(names(asc), vec!["Ari", "Bo", "Cam", "Dee"]);

    let page = store
        .list::<Client>(
            &active,
            &ListOptions::sorted_by("name", SortOrder::Desc)
                .with_offset(1)
                .with_limit(2),
        )
        .await
        .unwrap();
    assert_eq!(names(page), vec!["Cam", "Bo"]);

    assert_eq!(store.count::<Client>(&active).await.unwrap(), 4);
    assert_eq!(store.count::<Client>(&RecordFilter::new()).await.unwrap(), 5);
}

#[tokio::test]
async fn find_applies_predicates_and_options() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    for (name, role) in [
        ("Sam", StakeholderRole::SupportWorker),
        ("Kit", StakeholderRole::Therapist),
        ("Ash", StakeholderRole::SupportWorker),
    ] {
        store.put(stakeholder(name, role)).await.unwrap();
    }

    let workers = store
        .find::<Stakeholder, _>(
            |s| s.role == StakeholderRole::SupportWorker,
            &ListOptions::sorted_by("name", SortOrder::Asc),
        )
        .await
        .unwrap();
    let names: Vec<_> = workers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ash", "Sam"]);
}

#[tokio::test]
async fn list_rereads_file_while_cached_read_does_not() {
    let (dir, store) = json_store().await;
    let store = facade(store);
    let avery = client("Avery");
    store.put(avery.clone()).await.unwrap();

    // Edit the file behind the store's back.
    let path = dir.path().join("clients.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    value["records"][0]["notes"] = serde_json::json!("external");
    std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

    let listed = store.all::<Client>().await.unwrap();
    assert_eq!(listed[0].notes.as_deref(), Some("external"));

    let cached = store.get::<Client>(&avery.id).await.unwrap().unwrap();
    assert_eq!(cached.notes, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_racing_a_write_never_leave_a_stale_cache_entry() {
    let dir = tempfile::tempdir().unwrap();
    let seed = JsonFileStore::new(dir.path(), fast_policy());
    seed.initialize().await.unwrap();
    let seed = facade(seed);
    for i in 0..300 {
        seed.put(client(&format!("Filler {i}"))).await.unwrap();
    }

    for round in 0..20 {
        let store = JsonFileStore::new(dir.path(), fast_policy());
        store.initialize().await.unwrap();
        let store = facade(store);

        let mut target = client(&format!("Before {round}"));
        store.put(target.clone()).await.unwrap();
        // A fresh instance so the reads below miss the cache.
        let store = JsonFileStore::new(dir.path(), fast_policy());
        store.initialize().await.unwrap();
        let store = facade(store);

        target.name = format!("After {round}");
        let mut tasks = Vec::new();
        for i in 0..12 {
            let store = store.clone();
            let id = target.id.clone();
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_micros(i * 150)).await;
                store.get::<Client>(&id).await.unwrap();
            }));
        }
        let writer = {
            let store = store.clone();
            let updated = target.clone();
            tokio::spawn(async move { store.put(updated).await.unwrap() })
        };
        writer.await.unwrap();
        for task in join_all(tasks).await {
            task.unwrap();
        }

        let cached = store.get::<Client>(&target.id).await.unwrap().unwrap();
        assert_eq!(cached.name, target.name, "round {round}");
        let on_disk = store
            .list::<Client>(&RecordFilter::new().eq("id", target.id.as_str()), &ListOptions::default())
            .await
            .unwrap();
        assert_eq!(on_disk[0].name, target.name);
    }
}

#[tokio::test]
async fn corrupt_file_surfaces_as_storage_failure() {
    let (dir, store) = json_store().await;
    std::fs::write(dir.path().join("goals.json"), b"{ this is not json").unwrap();

    let err = store
        .list(Collection::Goals, &RecordFilter::new(), &ListOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Corrupt { collection: Collection::Goals, .. });
    assert_matches!(
        store.read(Collection::Goals, "any").await,
        Err(StoreError::Corrupt { .. })
    );

    let core: CoreError = err.into();
    assert_eq!(core.code(), "STORAGE_ERROR");
    assert!(!core.to_string().contains(dir.path().to_string_lossy().as_ref()));
}

#[tokio::test]
async fn corrupt_record_errors_do_not_echo_file_contents() {
    let (dir, store) = json_store().await;
    let path = dir.path().join("clients.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    value["records"] = serde_json::json!([{ "id": "c1", "name": 430123456 }]);
    std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

    let err = store
        .list(Collection::Clients, &RecordFilter::new(), &ListOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Corrupt { collection: Collection::Clients, .. });
    assert!(!err.to_string().contains("430123456"));

    let core: CoreError = err.into();
    assert!(!core.to_string().contains("430123456"));
}

// ---------------------------------------------------------------------------
// Backup / restore / stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restore_returns_to_snapshot_and_drops_cache() {
    let (dir, store) = json_store().await;
    let store = facade(store);
    let kept = client("Kept");
    let removed_later = client("Removed later");
    store.put(kept.clone()).await.unwrap();
    store.put(removed_later.clone()).await.unwrap();

    let backup_id = store.create_backup().await.unwrap();
    assert!(backup_id.starts_with("backup-"));
    assert!(dir.path().join("backups").join(&backup_id).join("clients.json").exists());

    store.remove::<Client>(&removed_later.id).await.unwrap();
    let added_later = client("Added later");
    store.put(added_later.clone()).await.unwrap();

    store.restore_backup(&backup_id).await.unwrap();

    assert!(store.get::<Client>(&removed_later.id).await.unwrap().is_some());
    assert_eq!(store.get::<Client>(&added_later.id).await.unwrap(), None);
    assert_eq!(store.count::<Client>(&RecordFilter::new()).await.unwrap(), 2);
}

#[tokio::test]
async fn restore_replaces_a_corrupt_collection() {
    let (dir, store) = json_store().await;
    let store = facade(store);
    store.put(client("Avery")).await.unwrap();
    let backup_id = store.create_backup().await.unwrap();

    std::fs::write(dir.path().join("clients.json"), b"garbage").unwrap();
    store.restore_backup(&backup_id).await.unwrap();
    assert_eq!(store.all::<Client>().await.unwrap().len(), 1);
}

#[tokio::test]
async fn backups_are_listed_newest_first() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    let first = store.create_backup().await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = store.create_backup().await.unwrap();

    assert_ne!(first, second);
    assert_eq!(store.list_backups().await.unwrap(), vec![second, first]);
}

#[tokio::test]
async fn restore_rejects_bad_identifiers() {
    let (_dir, store) = json_store().await;
    let store = facade(store);

    assert_matches!(
        store.restore_backup("../clients").await,
        Err(StoreError::InvalidBackupId(_))
    );
    assert_matches!(
        store.restore_backup("backup-20000101T000000.000Z").await,
        Err(StoreError::BackupNotFound(_))
    );
}

#[tokio::test]
async fn stats_count_every_collection() {
    let (_dir, store) = json_store().await;
    let store = facade(store);
    store.put(client("Avery")).await.unwrap();
    store.put(client("Blair")).await.unwrap();
    store
        .put(stakeholder("Sam", StakeholderRole::SupportWorker))
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.records_by_collection[&Collection::Clients], 2);
    assert_eq!(stats.records_by_collection[&Collection::Stakeholders], 1);
    assert_eq!(stats.records_by_collection[&Collection::Goals], 0);
    assert_eq!(stats.records_by_collection.len(), 5);
}
