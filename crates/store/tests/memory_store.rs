//! The in-memory backend honours the same contract as the file backend.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use futures::future::join_all;

use caseload_core::stakeholders::StakeholderRole;
use caseload_store::models::{Client, Stakeholder};
use caseload_store::{
    open_backend, ListOptions, MemoryStore, RecordFilter, SortOrder, StorageBackend,
    StorageBackendKind, Store, StoreConfig, StoreError,
};

use common::{client, stakeholder};

async fn memory_store() -> Store {
    Store::open(&StoreConfig::memory()).await.unwrap()
}

#[tokio::test]
async fn config_selects_the_memory_backend() {
    let backend = open_backend(&StoreConfig::memory());
    assert_eq!(backend.kind(), StorageBackendKind::Memory);
}

#[tokio::test]
async fn uninitialized_memory_store_rejects_calls() {
    let store = Store::new(Arc::new(MemoryStore::new()));
    assert_matches!(store.all::<Client>().await, Err(StoreError::Uninitialized));
}

#[tokio::test]
async fn round_trip_upsert_and_delete() {
    let store = memory_store().await;
    let mut avery = client("Avery");
    store.put(avery.clone()).await.unwrap();
    assert_eq!(store.get::<Client>(&avery.id).await.unwrap(), Some(avery.clone()));

    avery.notes = Some("updated".into());
    store.put(avery.clone()).await.unwrap();
    assert_eq!(store.count::<Client>(&RecordFilter::new()).await.unwrap(), 1);
    assert_eq!(store.get::<Client>(&avery.id).await.unwrap(), Some(avery.clone()));

    assert!(store.remove::<Client>(&avery.id).await.unwrap());
    assert!(!store.remove::<Client>(&avery.id).await.unwrap());
}

#[tokio::test]
async fn concurrent_writers_lose_no_updates() {
    let store = memory_store().await;
    let writes = (0..30).map(|i| {
        let store = store.clone();
        async move { store.put(client(&format!("Client {i}"))).await }
    });
    for result in join_all(writes).await {
        result.unwrap();
    }
    assert_eq!(store.count::<Client>(&RecordFilter::new()).await.unwrap(), 30);
}

#[tokio::test]
async fn list_and_find_match_file_semantics() {
    let store = memory_store().await;
    for (name, role) in [
        ("Sam", StakeholderRole::SupportWorker),
        ("Kit", StakeholderRole::Therapist),
        ("Ash", StakeholderRole::SupportWorker),
    ] {
        store.put(stakeholder(name, role)).await.unwrap();
    }

    let filter = RecordFilter::new().eq("role", "support_worker");
    let listed = store
        .list::<Stakeholder>(&filter, &ListOptions::sorted_by("name", SortOrder::Desc))
        .await
        .unwrap();
    let names: Vec<_> = listed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sam", "Ash"]);

    let found = store
        .find::<Stakeholder, _>(|s| s.name.starts_with('K'), &ListOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn backup_and_restore_round_trip() {
    let store = memory_store().await;
    let kept = client("Kept");
    store.put(kept.clone()).await.unwrap();
    let backup_id = store.create_backup().await.unwrap();

    store.remove::<Client>(&kept.id).await.unwrap();
    store.put(client("Later")).await.unwrap();
    store.restore_backup(&backup_id).await.unwrap();

    assert_eq!(store.all::<Client>().await.unwrap(), vec![kept]);
    assert_eq!(store.list_backups().await.unwrap(), vec![backup_id]);
    assert_matches!(
        store.restore_backup("backup-19990101T000000.000Z").await,
        Err(StoreError::BackupNotFound(_))
    );
}

#[tokio::test]
async fn stats_and_close() {
    let store = memory_store().await;
    store.put(client("Avery")).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_records, 1);

    store.close().await.unwrap();
    assert_matches!(store.stats().await, Err(StoreError::Uninitialized));
}
