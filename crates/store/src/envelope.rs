//! On-disk layout of a collection file.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use caseload_core::types::Timestamp;

use crate::collection::Collection;
use crate::error::{describe_serde_error, StoreError};

/// Format version written into every collection file.
pub const ENVELOPE_VERSION: &str = "1.0";

/// `{ version, last_updated, records: [...] }`.
///
/// `records` keeps insertion order; replacing an existing id rewrites it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    pub last_updated: Timestamp,
    #[serde(default)]
    pub records: Vec<Value>,
}

impl Envelope {
    pub fn empty() -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            last_updated: Utc::now(),
            records: Vec::new(),
        }
    }

    /// Parse file contents, reporting failures as corruption of `collection`.
    pub fn parse(collection: Collection, bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
            collection,
            reason: describe_serde_error(&e),
        })
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
    }

    /// Insert or replace by id; returns `true` when an existing record was replaced.
    pub fn upsert(&mut self, record: Value) -> bool {
        let id = record.get("id").and_then(Value::as_str).map(str::to_owned);
        match id.and_then(|id| self.position(&id)) {
            Some(idx) => {
                self.records[idx] = record;
                true
            }
            None => {
                self.records.push(record);
                false
            }
        }
    }

    /// Remove by id; returns whether a record existed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.records.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, StoreError> {
        self.last_updated = Utc::now();
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
