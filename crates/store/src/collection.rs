//! Collection identity and the closed record sum type.
//!
//! Every backend receives records as [`StoredRecord`] and pattern-matches on
//! the variant instead of trusting caller-supplied shapes. The [`Record`]
//! trait lets the typed [`Store`](crate::Store) facade move between concrete
//! models and the sum type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Activity, Client, Goal, ShiftNote, Stakeholder};

/// The fixed set of collections. Each maps to exactly one backing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Clients,
    Goals,
    Activities,
    ShiftNotes,
    Stakeholders,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Clients,
        Collection::Goals,
        Collection::Activities,
        Collection::ShiftNotes,
        Collection::Stakeholders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Goals => "goals",
            Collection::Activities => "activities",
            Collection::ShiftNotes => "shift_notes",
            Collection::Stakeholders => "stakeholders",
        }
    }

    /// File name of the collection's backing file.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record tagged with the collection it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRecord {
    Client(Client),
    Goal(Goal),
    Activity(Activity),
    ShiftNote(ShiftNote),
    Stakeholder(Stakeholder),
}

impl StoredRecord {
    pub fn collection(&self) -> Collection {
        match self {
            StoredRecord::Client(_) => Collection::Clients,
            StoredRecord::Goal(_) => Collection::Goals,
            StoredRecord::Activity(_) => Collection::Activities,
            StoredRecord::ShiftNote(_) => Collection::ShiftNotes,
            StoredRecord::Stakeholder(_) => Collection::Stakeholders,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StoredRecord::Client(r) => &r.id,
            StoredRecord::Goal(r) => &r.id,
            StoredRecord::Activity(r) => &r.id,
            StoredRecord::ShiftNote(r) => &r.id,
            StoredRecord::Stakeholder(r) => &r.id,
        }
    }

    /// Serialize the inner record to its persisted JSON form.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        let value = match self {
            StoredRecord::Client(r) => serde_json::to_value(r)?,
            StoredRecord::Goal(r) => serde_json::to_value(r)?,
            StoredRecord::Activity(r) => serde_json::to_value(r)?,
            StoredRecord::ShiftNote(r) => serde_json::to_value(r)?,
            StoredRecord::Stakeholder(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }

    /// Decode a persisted JSON record belonging to `collection`.
    pub fn from_value(collection: Collection, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match collection {
            Collection::Clients => StoredRecord::Client(serde_json::from_value(value)?),
            Collection::Goals => StoredRecord::Goal(serde_json::from_value(value)?),
            Collection::Activities => StoredRecord::Activity(serde_json::from_value(value)?),
            Collection::ShiftNotes => StoredRecord::ShiftNote(serde_json::from_value(value)?),
            Collection::Stakeholders => StoredRecord::Stakeholder(serde_json::from_value(value)?),
        })
    }
}

/// A model that lives in exactly one collection.
pub trait Record: Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Entity name used in not-found errors.
    const ENTITY: &'static str;

    fn id(&self) -> &str;

    fn into_stored(self) -> StoredRecord;

    fn from_stored(record: StoredRecord) -> Result<Self, StoreError>;

    fn from_stored_ref(record: &StoredRecord) -> Option<&Self>;
}

macro_rules! impl_record {
    ($model:ident, $variant:ident, $collection:expr, $entity:literal) => {
        impl Record for $model {
            const COLLECTION: Collection = $collection;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn into_stored(self) -> StoredRecord {
                StoredRecord::$variant(self)
            }

            fn from_stored(record: StoredRecord) -> Result<Self, StoreError> {
                match record {
                    StoredRecord::$variant(r) => Ok(r),
                    other => Err(StoreError::CollectionMismatch {
                        expected: $collection,
                        found: other.collection(),
                    }),
                }
            }

            fn from_stored_ref(record: &StoredRecord) -> Option<&Self> {
                match record {
                    StoredRecord::$variant(r) => Some(r),
                    _ => None,
                }
            }
        }

        impl From<$model> for StoredRecord {
            fn from(record: $model) -> Self {
                StoredRecord::$variant(record)
            }
        }
    };
}

impl_record!(Client, Client, Collection::Clients, "Client");
impl_record!(Goal, Goal, Collection::Goals, "Goal");
impl_record!(Activity, Activity, Collection::Activities, "Activity");
impl_record!(ShiftNote, ShiftNote, Collection::ShiftNotes, "ShiftNote");
impl_record!(Stakeholder, Stakeholder, Collection::Stakeholders, "Stakeholder");
