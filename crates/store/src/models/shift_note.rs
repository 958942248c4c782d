//! Shift note model.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use caseload_core::temporal::hhmm;
use caseload_core::types::{Date, RecordId, Timestamp};

/// Progress observed against one goal during a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GoalProgressEntry {
    #[validate(length(min = 1, message = "goal_id is required"))]
    pub goal_id: RecordId,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub progress_notes: String,
    /// Rating on a 1-10 scale.
    #[validate(range(min = 1, max = 10, message = "Progress rating must be between 1 and 10"))]
    pub progress_observed: i32,
}

/// A stored shift note record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftNote {
    pub id: RecordId,
    pub client_id: RecordId,
    pub stakeholder_id: RecordId,
    pub shift_date: Date,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub general_observations: String,
    #[serde(default)]
    pub activity_ids: Vec<RecordId>,
    #[serde(default)]
    pub goals_progress: Vec<GoalProgressEntry>,
    pub challenges: Option<String>,
    pub next_steps: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new shift note.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateShiftNote {
    #[validate(length(min = 1, message = "client_id is required"))]
    pub client_id: RecordId,
    #[validate(length(min = 1, message = "stakeholder_id is required"))]
    pub stakeholder_id: RecordId,
    pub shift_date: Date,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub general_observations: String,
    #[serde(default)]
    pub activity_ids: Vec<RecordId>,
    #[serde(default)]
    #[validate(nested)]
    pub goals_progress: Vec<GoalProgressEntry>,
    #[validate(length(max = 5000))]
    pub challenges: Option<String>,
    #[validate(length(max = 5000))]
    pub next_steps: Option<String>,
}

/// DTO for updating a shift note. Client, stakeholder and shift date are fixed.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateShiftNote {
    #[serde(default, with = "hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option")]
    pub end_time: Option<NaiveTime>,
    pub general_observations: Option<String>,
    pub activity_ids: Option<Vec<RecordId>>,
    #[validate(nested)]
    pub goals_progress: Option<Vec<GoalProgressEntry>>,
    #[validate(length(max = 5000))]
    pub challenges: Option<String>,
    #[validate(length(max = 5000))]
    pub next_steps: Option<String>,
}

/// Parameters for listing shift notes. Results are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftNoteListParams {
    pub client_id: Option<RecordId>,
    pub stakeholder_id: Option<RecordId>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
