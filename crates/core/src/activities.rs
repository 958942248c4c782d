//! Activity types, statuses and time/duration rules.

use chrono::{Duration, NaiveTime};

use crate::error::CoreError;
use crate::temporal::{ensure_within_backdate, minutes_between};
use crate::types::Date;

/// Allowed disagreement between explicit times and an explicit duration.
pub const DURATION_TOLERANCE_MINUTES: i64 = 5;

/// Longest duration a single activity may record.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// How far ahead the dashboard looks for scheduled activities.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

pub const MAX_ACTIVITY_TITLE_LENGTH: u64 = 200;

define_label_enum! {
    /// Kind of support delivered during an activity.
    ActivityType {
        LifeSkills => "life_skills",
        SocialRecreation => "social_recreation",
        PersonalCare => "personal_care",
        CommunityAccess => "community_access",
        Transport => "transport",
        TherapySupport => "therapy_support",
        HouseholdTasks => "household_tasks",
        EmploymentSupport => "employment_support",
        Other => "other",
    }
}

define_label_enum! {
    /// Activity lifecycle status.
    ActivityStatus {
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

impl ActivityStatus {
    /// Statuses that describe something that already happened.
    pub fn is_outcome(self) -> bool {
        matches!(self, ActivityStatus::Completed | ActivityStatus::NoShow)
    }
}

/// Reconcile optional start/end times with an optional explicit duration.
///
/// - Start and end must be given together; end must follow start.
/// - With times and a duration, they must agree within
///   [`DURATION_TOLERANCE_MINUTES`].
/// - With times only, the duration is derived as end - start.
/// - With a duration only, it is kept as given.
pub fn resolve_duration(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    duration_minutes: Option<i64>,
) -> Result<Option<i64>, CoreError> {
    if let Some(d) = duration_minutes {
        if d <= 0 || d > MAX_DURATION_MINUTES {
            return Err(CoreError::invalid_field(
                "duration_minutes",
                format!("Duration must be between 1 and {MAX_DURATION_MINUTES} minutes"),
            ));
        }
    }

    match (start, end) {
        (Some(start), Some(end)) => {
            let span = minutes_between(start, end);
            if span <= 0 {
                return Err(CoreError::invalid_field(
                    "end_time",
                    "End time must be after start time",
                ));
            }
            match duration_minutes {
                Some(d) if (d - span).abs() > DURATION_TOLERANCE_MINUTES => {
                    Err(CoreError::invalid_field(
                        "duration_minutes",
                        format!(
                            "Duration of {d} minutes does not match the {span} minutes between \
                             start and end time"
                        ),
                    ))
                }
                Some(d) => Ok(Some(d)),
                None => Ok(Some(span)),
            }
        }
        (Some(_), None) => Err(CoreError::invalid_field(
            "end_time",
            "End time is required when start time is given",
        )),
        (None, Some(_)) => Err(CoreError::invalid_field(
            "start_time",
            "Start time is required when end time is given",
        )),
        (None, None) => Ok(duration_minutes),
    }
}

/// Date rules for an activity.
///
/// Activities may be scheduled ahead, but completed / no-show activities
/// cannot be dated in the future, and nothing may be logged more than
/// `max_backdate_days` in the past.
pub fn validate_activity_date(
    date: Date,
    status: ActivityStatus,
    today: Date,
    max_backdate_days: i64,
) -> Result<(), CoreError> {
    ensure_within_backdate("activity_date", date, today, max_backdate_days)?;
    if status.is_outcome() && date > today {
        return Err(CoreError::invalid_field(
            "activity_date",
            format!("A '{status}' activity cannot be dated in the future"),
        ));
    }
    Ok(())
}

/// Scheduled activity falling within the next [`UPCOMING_WINDOW_DAYS`] days.
pub fn is_upcoming(status: ActivityStatus, date: Date, today: Date) -> bool {
    status == ActivityStatus::Scheduled
        && date >= today
        && date <= today + Duration::days(UPCOMING_WINDOW_DAYS)
}
