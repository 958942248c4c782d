//! Shift note rules: shift times, observation length, progress ratings and
//! the edit window.

use chrono::{Duration, NaiveTime};

use crate::error::CoreError;
use crate::temporal::{minutes_between, start_of_day};
use crate::types::{Date, Timestamp};

/// Hours after the start of the shift date during which a note stays editable.
pub const EDIT_WINDOW_HOURS: i64 = 24;

/// Longest shift a single note may cover.
pub const MAX_SHIFT_HOURS: i64 = 12;

pub const MIN_OBSERVATION_LENGTH: u64 = 10;
pub const MAX_OBSERVATION_LENGTH: u64 = 5_000;

/// Observed progress is rated on a 1-10 scale.
pub const MIN_PROGRESS_RATING: i32 = 1;
pub const MAX_PROGRESS_RATING: i32 = 10;

/// Default number of shift notes returned by "recent" queries.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Instant at which the edit window anchored at `anchor` closes.
pub fn edit_window_closes_at(anchor: Timestamp) -> Timestamp {
    anchor + Duration::hours(EDIT_WINDOW_HOURS)
}

/// A note is editable while `now` is strictly before `anchor + 24h`.
pub fn is_within_edit_window(anchor: Timestamp, now: Timestamp) -> bool {
    now < edit_window_closes_at(anchor)
}

/// The edit window of a note opens at the start of its shift date.
pub fn edit_anchor(shift_date: Date) -> Timestamp {
    start_of_day(shift_date)
}

/// Reject edits once the window has closed. There is no override.
pub fn ensure_editable(shift_date: Date, now: Timestamp) -> Result<(), CoreError> {
    if is_within_edit_window(edit_anchor(shift_date), now) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Shift notes can only be edited within {EDIT_WINDOW_HOURS} hours of the shift date"
        )))
    }
}

/// Validate shift start/end and return the duration in minutes.
///
/// End must be strictly after start on the same day, and the shift may not
/// exceed [`MAX_SHIFT_HOURS`].
pub fn validate_shift_times(start: NaiveTime, end: NaiveTime) -> Result<i64, CoreError> {
    let minutes = minutes_between(start, end);
    if minutes <= 0 {
        return Err(CoreError::invalid_field(
            "end_time",
            "End time must be after start time",
        ));
    }
    if minutes > MAX_SHIFT_HOURS * 60 {
        return Err(CoreError::invalid_field(
            "end_time",
            format!("Shift duration cannot exceed {MAX_SHIFT_HOURS} hours"),
        ));
    }
    Ok(minutes)
}

/// Reject ratings outside 1..=10.
pub fn validate_progress_rating(rating: i32) -> Result<(), CoreError> {
    if !(MIN_PROGRESS_RATING..=MAX_PROGRESS_RATING).contains(&rating) {
        return Err(CoreError::invalid_field(
            "progress_observed",
            format!(
                "Progress rating must be between {MIN_PROGRESS_RATING} and {MAX_PROGRESS_RATING}"
            ),
        ));
    }
    Ok(())
}

/// Observation text must carry real content once trimmed.
pub fn validate_observations(text: &str) -> Result<(), CoreError> {
    let len = text.trim().chars().count() as u64;
    if len < MIN_OBSERVATION_LENGTH {
        return Err(CoreError::invalid_field(
            "general_observations",
            format!("Observations must be at least {MIN_OBSERVATION_LENGTH} characters"),
        ));
    }
    if len > MAX_OBSERVATION_LENGTH {
        return Err(CoreError::invalid_field(
            "general_observations",
            format!("Observations cannot exceed {MAX_OBSERVATION_LENGTH} characters"),
        ));
    }
    Ok(())
}
