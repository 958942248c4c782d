//! Dependencies shared by every service, plus the lookup helpers they use.

use std::sync::Arc;

use caseload_core::error::CoreError;
use caseload_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use caseload_core::types::{is_valid_record_id, Date, Timestamp};
use caseload_store::{ListOptions, Record, SortOrder, Store};

use crate::clock::{Clock, SystemClock};
use crate::config::RuleConfig;

/// Explicitly constructed dependencies handed to each service.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Store,
    pub rules: Arc<RuleConfig>,
    pub clock: Arc<dyn Clock>,
}

impl ServiceContext {
    pub fn new(store: Store, rules: RuleConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            rules: Arc::new(rules),
            clock,
        }
    }

    /// Default rules and the system clock.
    pub fn with_defaults(store: Store) -> Self {
        Self::new(store, RuleConfig::default(), Arc::new(SystemClock))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn today(&self) -> Date {
        self.clock.today()
    }

    /// Fetch a record by its own id, failing with not-found when absent.
    pub async fn fetch<T: Record>(&self, id: &str) -> Result<T, CoreError> {
        self.fetch_ref("id", id).await
    }

    /// Fetch a record referenced from `field` of another record.
    pub async fn fetch_ref<T: Record>(&self, field: &str, id: &str) -> Result<T, CoreError> {
        require_id(field, id)?;
        self.store
            .get::<T>(id)
            .await?
            .ok_or_else(|| CoreError::not_found(T::ENTITY, id))
    }

    /// Fetch a record when it exists; a dangling reference yields `None`.
    pub async fn lookup<T: Record>(&self, id: &str) -> Result<Option<T>, CoreError> {
        Ok(self.store.get::<T>(id).await?)
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("store", &self.store)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Ids must be non-empty and shaped like the identifiers we generate.
pub fn require_id(field: &str, id: &str) -> Result<(), CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::invalid_field(field, format!("'{field}' is required")));
    }
    if !is_valid_record_id(id) {
        return Err(CoreError::invalid_field(
            field,
            format!("'{field}' is not a valid identifier"),
        ));
    }
    Ok(())
}

/// Sorted, clamped page options for list operations.
pub fn page_options(
    sort_by: &str,
    order: SortOrder,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ListOptions {
    let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(offset);
    ListOptions::sorted_by(sort_by, order)
        .with_limit(limit as usize)
        .with_offset(offset as usize)
}

/// `updated_at` never moves backwards, even if the clock does.
pub fn touch(previous: Timestamp, now: Timestamp) -> Timestamp {
    previous.max(now)
}

/// Trim a required text field, rejecting input that is blank once trimmed.
pub fn required_text(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_field(field, format!("{field} cannot be blank")));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free text, turning blank input into `None`.
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn require_id_rejects_blank_and_malformed() {
        assert_eq!(require_id("client_id", "").unwrap_err().field(), Some("client_id"));
        assert!(require_id("id", "not-a-uuid").is_err());
        assert!(require_id("id", &caseload_core::types::new_record_id()).is_ok());
    }

    #[test]
    fn page_options_are_clamped() {
        let options = page_options("name", SortOrder::Asc, Some(10_000), Some(-3));
        assert_eq!(options.limit, Some(MAX_LIST_LIMIT as usize));
        assert_eq!(options.offset, Some(0));
    }

    #[test]
    fn touch_is_monotonic() {
        let now = Utc::now();
        assert_eq!(touch(now, now - Duration::seconds(5)), now);
        assert_eq!(touch(now - Duration::seconds(5), now), now);
    }

    #[test]
    fn required_text_rejects_whitespace_only() {
        assert_eq!(required_text("name", " \t ").unwrap_err().field(), Some("name"));
        assert_eq!(required_text("name", "  Jordan ").unwrap(), "Jordan");
    }

    #[test]
    fn clean_text_drops_blank() {
        assert_eq!(clean_text(Some("  ".into())), None);
        assert_eq!(clean_text(Some(" x ".into())), Some("x".into()));
    }
}
