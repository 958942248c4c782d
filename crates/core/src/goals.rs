//! Goal categories, statuses and the progress / risk rules.
//!
//! A goal is "at risk" when it is still being pursued, has less than half
//! of its progress recorded, and its target date falls within the next two
//! weeks. Goals already past their target date are overdue, not at risk.

use crate::error::CoreError;
use crate::temporal::days_between;
use crate::types::{Date, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Progress below this percentage can put a goal at risk.
pub const AT_RISK_PROGRESS_THRESHOLD: i32 = 50;

/// How many days ahead of the target date the risk window opens.
pub const AT_RISK_WINDOW_DAYS: i64 = 14;

/// Progress is a whole percentage.
pub const MIN_PROGRESS: i32 = 0;
pub const MAX_PROGRESS: i32 = 100;

pub const MAX_GOAL_TITLE_LENGTH: u64 = 200;
pub const MAX_GOAL_DESCRIPTION_LENGTH: u64 = 2_000;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

define_label_enum! {
    /// Support domain a goal belongs to.
    GoalCategory {
        DailyLiving => "daily_living",
        SocialCommunity => "social_community",
        Employment => "employment",
        HealthWellbeing => "health_wellbeing",
        HomeLiving => "home_living",
        LifelongLearning => "lifelong_learning",
        Relationships => "relationships",
        ChoiceControl => "choice_control",
    }
}

define_label_enum! {
    /// Goal lifecycle status.
    GoalStatus {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Achieved => "achieved",
        OnHold => "on_hold",
        Discontinued => "discontinued",
    }
}

impl GoalStatus {
    /// Achieved and discontinued goals are no longer being worked on.
    pub fn is_closed(self) -> bool {
        matches!(self, GoalStatus::Achieved | GoalStatus::Discontinued)
    }
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

/// Whole days from `today` until `target_date` (negative once overdue).
pub fn days_until_target(target_date: Date, today: Date) -> i64 {
    days_between(today, target_date)
}

/// Risk rule: open, under 50%, and 0..=14 days left.
///
/// A goal whose target date has already passed is overdue and is *not*
/// reported as at risk.
pub fn is_at_risk(status: GoalStatus, progress: i32, target_date: Date, today: Date) -> bool {
    if status.is_closed() || progress >= AT_RISK_PROGRESS_THRESHOLD {
        return false;
    }
    let days = days_until_target(target_date, today);
    (0..=AT_RISK_WINDOW_DAYS).contains(&days)
}

/// Open goal whose target date has passed.
pub fn is_overdue(status: GoalStatus, target_date: Date, today: Date) -> bool {
    !status.is_closed() && target_date < today
}

/// Goals counted as "active": not archived and not closed.
pub fn is_active(status: GoalStatus, archived: bool) -> bool {
    !archived && !status.is_closed()
}

// ---------------------------------------------------------------------------
// Progress / status alignment
// ---------------------------------------------------------------------------

/// Reject progress values outside 0..=100.
pub fn validate_progress(progress: i32) -> Result<(), CoreError> {
    if !(MIN_PROGRESS..=MAX_PROGRESS).contains(&progress) {
        return Err(CoreError::invalid_field(
            "progress_percentage",
            format!("Progress must be between {MIN_PROGRESS} and {MAX_PROGRESS}"),
        ));
    }
    Ok(())
}

/// Status implied by a progress value when the caller gives no explicit status.
pub fn suggest_status(progress: i32) -> GoalStatus {
    match progress {
        p if p <= MIN_PROGRESS => GoalStatus::NotStarted,
        p if p >= MAX_PROGRESS => GoalStatus::Achieved,
        _ => GoalStatus::InProgress,
    }
}

/// Check that `status` and `progress` agree.
///
/// - `achieved` requires 100%.
/// - `not_started` requires 0%.
/// - 100% requires `achieved`.
///
/// Mismatches are rejected, never coerced.
pub fn validate_status_progress(status: GoalStatus, progress: i32) -> Result<(), CoreError> {
    validate_progress(progress)?;
    match status {
        GoalStatus::Achieved if progress != MAX_PROGRESS => Err(CoreError::invalid_field(
            "status",
            "An achieved goal must have 100% progress",
        )),
        GoalStatus::NotStarted if progress != MIN_PROGRESS => Err(CoreError::invalid_field(
            "status",
            "A goal that has not started must have 0% progress",
        )),
        s if progress == MAX_PROGRESS && s != GoalStatus::Achieved => {
            Err(CoreError::invalid_field(
                "progress_percentage",
                format!("100% progress requires status 'achieved', got '{s}'"),
            ))
        }
        _ => Ok(()),
    }
}

/// Resolve the effective status for an update.
///
/// An explicit status always wins. Otherwise a progress change derives the
/// status via [`suggest_status`]; with neither, the current status stands.
pub fn resolve_status(
    current: GoalStatus,
    explicit: Option<GoalStatus>,
    new_progress: Option<i32>,
) -> GoalStatus {
    match (explicit, new_progress) {
        (Some(status), _) => status,
        (None, Some(progress)) => suggest_status(progress),
        (None, None) => current,
    }
}

/// `achieved_at` bookkeeping across a status transition.
///
/// Set when entering `achieved`, kept while staying there, cleared on leaving.
pub fn resolve_achieved_at(
    previous: GoalStatus,
    next: GoalStatus,
    previous_achieved_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match (previous, next) {
        (GoalStatus::Achieved, GoalStatus::Achieved) => previous_achieved_at.or(Some(now)),
        (_, GoalStatus::Achieved) => Some(now),
        _ => None,
    }
}

/// Target dates must be today or later when the goal is created.
pub fn validate_target_date(target_date: Date, today: Date) -> Result<(), CoreError> {
    if target_date < today {
        return Err(CoreError::invalid_field(
            "target_date",
            "Target date cannot be in the past",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
