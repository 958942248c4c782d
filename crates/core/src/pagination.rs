//! Pagination bounds shared by every list operation.

/// Default page size when the caller does not supply a limit.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Hard ceiling on a single page.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Number of entries in the dashboard's "recent" lists.
pub const DASHBOARD_RECENT_LIMIT: usize = 10;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
