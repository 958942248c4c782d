//! Goal model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use caseload_core::goals::{GoalCategory, GoalStatus};
use caseload_core::types::{Date, RecordId, Timestamp};

/// A stored goal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: RecordId,
    pub client_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub target_date: Date,
    pub status: GoalStatus,
    pub progress_percentage: i32,
    #[serde(default)]
    pub archived: bool,
    pub achieved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new goal.
///
/// `status` and `progress_percentage` default to `not_started` / 0.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGoal {
    #[validate(length(min = 1, message = "client_id is required"))]
    pub client_id: RecordId,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub category: GoalCategory,
    pub target_date: Date,
    pub status: Option<GoalStatus>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress_percentage: Option<i32>,
}

/// DTO for updating a goal.
///
/// When `progress_percentage` is set without `status`, the status is derived
/// from the new progress.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGoal {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub category: Option<GoalCategory>,
    pub target_date: Option<Date>,
    pub status: Option<GoalStatus>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress_percentage: Option<i32>,
}

/// Parameters for listing goals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalListParams {
    pub client_id: Option<RecordId>,
    pub status: Option<GoalStatus>,
    pub category: Option<GoalCategory>,
    #[serde(default)]
    pub include_archived: bool,
    #[serde(default)]
    pub at_risk_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
