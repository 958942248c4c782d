use caseload_core::error::CoreError;
use serde_json::error::Category;

use crate::collection::Collection;

/// Failures raised by a storage backend.
///
/// Messages name collections and operations, never file system paths.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage has not been initialized")]
    Uninitialized,

    #[error("Timed out acquiring the '{collection}' lock after {attempts} attempts")]
    LockTimeout { collection: Collection, attempts: u32 },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Collection '{collection}' is corrupt: {reason}")]
    Corrupt { collection: Collection, reason: String },

    #[error("Serialization error: {}", describe_serde_error(.0))]
    Serialization(#[from] serde_json::Error),

    #[error("Expected a '{expected}' record, found a '{found}' record")]
    CollectionMismatch {
        expected: Collection,
        found: Collection,
    },

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Invalid backup identifier: {0}")]
    InvalidBackupId(String),
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Category and position of a serde failure, without the offending text.
///
/// serde messages quote the values they reject, and collection files hold
/// personal details, so only the shape of the failure is reported.
pub(crate) fn describe_serde_error(err: &serde_json::Error) -> String {
    let category = match err.classify() {
        Category::Io => "I/O failure",
        Category::Syntax => "malformed JSON",
        Category::Data => "unexpected data",
        Category::Eof => "truncated JSON",
    };
    if err.line() == 0 {
        category.to_string()
    } else {
        format!("{category} at line {}, column {}", err.line(), err.column())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BackupNotFound(id) => CoreError::NotFound {
                entity: "Backup",
                id,
            },
            StoreError::InvalidBackupId(id) => CoreError::invalid_field(
                "backup_id",
                format!("Invalid backup identifier '{id}'"),
            ),
            other => CoreError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_maps_to_storage() {
        let err: CoreError = StoreError::LockTimeout {
            collection: Collection::Goals,
            attempts: 5,
        }
        .into();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert!(err.is_transient());
        assert!(err.to_string().contains("goals"));
    }

    #[test]
    fn backup_errors_map_to_caller_errors() {
        let err: CoreError = StoreError::BackupNotFound("backup-x".into()).into();
        assert_eq!(err.code(), "NOT_FOUND");
        let err: CoreError = StoreError::InvalidBackupId("../etc".into()).into();
        assert_eq!(err.field(), Some("backup_id"));
    }

    #[test]
    fn serde_descriptions_omit_record_values() {
        let err = serde_json::from_str::<Vec<u32>>(r#"["Jordan Lee 430123456"]"#).unwrap_err();
        let described = describe_serde_error(&err);
        assert!(described.starts_with("unexpected data at line 1"));
        assert!(!described.contains("Jordan"));

        let err = serde_json::from_value::<u32>(serde_json::json!("430123456")).unwrap_err();
        assert_eq!(describe_serde_error(&err), "unexpected data");

        let storage: CoreError = StoreError::Serialization(err).into();
        assert!(!storage.to_string().contains("430123456"));
    }
}
