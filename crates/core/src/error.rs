use crate::types::RecordId;

/// Domain failure taxonomy shared by every service.
///
/// Messages carry entity names and opaque ids only. Field values that could
/// identify a person (names, dates of birth, contact details) never appear here.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: RecordId },

    #[error("Validation failed: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation is categorically disallowed right now (e.g. an expired
    /// edit window), even though the request itself is well-formed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The persistence layer could not complete the operation. Potentially
    /// transient; callers may retry the whole operation.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Validation failure attributed to a specific input field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Validation failure not attributable to a single field.
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<RecordId>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable error code exposed at the protocol boundary.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Validation { .. } => "VALIDATION_ERROR",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::Storage(_) => "STORAGE_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The offending input field, when one is identifiable.
    pub fn field(&self) -> Option<&str> {
        match self {
            CoreError::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Whether retrying the same operation unchanged could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Storage(_))
    }
}

/// Convert derive-based field validation failures into a [`CoreError`].
///
/// Only the first failing field is reported; field errors are ordered by
/// field name so the result is deterministic.
impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.into_iter().next() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"));
                CoreError::invalid_field(field.to_string(), message)
            }
            None => CoreError::invalid(errors.to_string()),
        }
    }
}
