//! Exact-match filters, single-field sorting and pagination over records in
//! their persisted JSON form.

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::Value;

/// Conjunction of exact-match constraints over top-level record fields.
///
/// Fields not named in the filter are unconstrained; an empty filter matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    conditions: Vec<(String, Value)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Require `field` to equal `value` when `value` is set.
    pub fn eq_opt(self, field: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sorting and pagination applied after filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl ListOptions {
    pub fn sorted_by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort_by: Some(field.into()),
            sort_order: order,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Rank of a JSON value's type; null / missing always sorts last.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Bool(_)) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Array(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Null) | None => 5,
    }
}

/// Compare two field values.
///
/// Numbers compare numerically, strings lexically (ISO dates and RFC3339
/// timestamps therefore sort chronologically), booleans false-first. Nulls
/// and missing fields sort after every value regardless of direction; their
/// relative order is left as found.
pub fn compare_field(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra == 5 || rb == 5 {
        return ra.cmp(&rb);
    }
    let ordering = match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => ra.cmp(&rb),
    };
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Sort (stable) and paginate `items`, each paired with its JSON view.
pub fn apply_options<T>(mut items: Vec<(Value, T)>, options: &ListOptions) -> Vec<T> {
    if let Some(field) = options.sort_by.as_deref() {
        items.sort_by(|(a, _), (b, _)| compare_field(a.get(field), b.get(field), options.sort_order));
    }
    let offset = options.offset.unwrap_or(0);
    let limit = options.limit.unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(_, item)| item)
        .collect()
}
