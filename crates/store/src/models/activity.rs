//! Activity model.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use caseload_core::activities::{ActivityStatus, ActivityType};
use caseload_core::temporal::hhmm;
use caseload_core::types::{Date, RecordId, Timestamp};

/// A stored activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: RecordId,
    pub client_id: RecordId,
    pub stakeholder_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub activity_type: ActivityType,
    pub activity_date: Date,
    #[serde(default, with = "hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub status: ActivityStatus,
    #[serde(default)]
    pub goal_ids: Vec<RecordId>,
    pub location: Option<String>,
    pub outcome_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new activity. `status` defaults to `scheduled`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateActivity {
    #[validate(length(min = 1, message = "client_id is required"))]
    pub client_id: RecordId,
    #[validate(length(min = 1, message = "stakeholder_id is required"))]
    pub stakeholder_id: RecordId,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub activity_type: ActivityType,
    pub activity_date: Date,
    #[serde(default, with = "hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub status: Option<ActivityStatus>,
    #[serde(default)]
    pub goal_ids: Vec<RecordId>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 5000))]
    pub outcome_notes: Option<String>,
}

/// DTO for updating an activity.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateActivity {
    #[validate(length(min = 1, message = "client_id cannot be empty"))]
    pub client_id: Option<RecordId>,
    #[validate(length(min = 1, message = "stakeholder_id cannot be empty"))]
    pub stakeholder_id: Option<RecordId>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub activity_date: Option<Date>,
    #[serde(default, with = "hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub status: Option<ActivityStatus>,
    pub goal_ids: Option<Vec<RecordId>>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 5000))]
    pub outcome_notes: Option<String>,
}

/// Parameters for listing activities. Results are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityListParams {
    pub client_id: Option<RecordId>,
    pub stakeholder_id: Option<RecordId>,
    pub status: Option<ActivityStatus>,
    pub activity_type: Option<ActivityType>,
    pub goal_id: Option<RecordId>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
