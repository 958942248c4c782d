//! Persistence for the caseload domain: entity models, the storage backend
//! contract with its JSON-file and in-memory implementations, and the typed
//! [`Store`] facade the services use.

pub mod backend;
pub mod cache;
pub mod collection;
pub mod config;
pub mod envelope;
pub mod error;
pub mod json_store;
pub mod lock;
pub mod memory_store;
pub mod models;
pub mod query;
pub mod store;

pub use backend::{open_backend, StorageBackend, StoreStats};
pub use collection::{Collection, Record, StoredRecord};
pub use config::{StorageBackendKind, StoreConfig};
pub use error::StoreError;
pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use query::{ListOptions, RecordFilter, SortOrder};
pub use store::Store;
