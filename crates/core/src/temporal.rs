//! Date and time helpers.
//!
//! Pure functions only: callers pass "today" / "now" explicitly wherever a
//! rule depends on the current time, so every rule can be tested with fixed
//! instants.

use chrono::{Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::{Date, Timestamp};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for wall-clock times (24-hour).
pub const TIME_FORMAT: &str = "%H:%M";

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).num_days()
}

/// Minutes from `start` to `end` on the same day (negative when `end` is earlier).
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes()
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: Date) -> Timestamp {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: Date) -> (Date, Date) {
    let offset = i64::from(date.weekday().num_days_from_monday());
    let monday = date - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

/// Inclusive range check; unset bounds are unconstrained.
pub fn within_range(date: Date, from: Option<Date>, to: Option<Date>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

/// Reject dates after `today`.
pub fn ensure_not_future(field: &str, date: Date, today: Date) -> Result<(), CoreError> {
    if date > today {
        return Err(CoreError::invalid_field(
            field,
            format!("'{field}' cannot be in the future"),
        ));
    }
    Ok(())
}

/// Reject dates more than `max_days` before `today`.
pub fn ensure_within_backdate(
    field: &str,
    date: Date,
    today: Date,
    max_days: i64,
) -> Result<(), CoreError> {
    if days_between(date, today) > max_days {
        return Err(CoreError::invalid_field(
            field,
            format!("'{field}' cannot be more than {max_days} days in the past"),
        ));
    }
    Ok(())
}

/// Serde adapter for `HH:MM` wall-clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional fields.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::TIME_FORMAT;

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.serialize_some(&t.format(TIME_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| NaiveTime::parse_from_str(s.trim(), TIME_FORMAT))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}
