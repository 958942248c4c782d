//! Handlers for `/tools`: decode the arguments, call the matching service
//! operation and wrap the result in the data envelope.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::{json, Map, Value};

use caseload_core::goals::GoalStatus;
use caseload_core::types::RecordId;
use caseload_services::Services;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::tools::Tool;

// ---------------------------------------------------------------------------
// Argument shapes that are not service DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: RecordId,
}

#[derive(Debug, Deserialize)]
struct ClientIdArgs {
    client_id: RecordId,
}

#[derive(Debug, Deserialize)]
struct RecentShiftNotesArgs {
    client_id: Option<RecordId>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GoalsAtRiskArgs {
    client_id: Option<RecordId>,
}

#[derive(Debug, Deserialize)]
struct GoalProgressArgs {
    id: RecordId,
    progress_percentage: i32,
    status: Option<GoalStatus>,
}

#[derive(Debug, Deserialize)]
struct BackupArgs {
    backup_id: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/tools
pub async fn list_tools() -> Json<DataResponse<&'static [Tool]>> {
    Json(DataResponse { data: Tool::ALL })
}

/// POST /api/v1/tools/{name}
///
/// The body is a JSON object of arguments; an empty body means no arguments.
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> AppResult<Json<DataResponse<Value>>> {
    let tool = Tool::from_name(&name)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown tool '{name}'")))?;
    let args = parse_args(tool, &body)?;

    tracing::debug!(tool = %tool, "Dispatching tool call");
    let data = dispatch(&state.services, tool, args).await?;
    Ok(Json(DataResponse { data }))
}

fn parse_args(tool: Tool, body: &[u8]) -> AppResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(AppError::BadRequest(format!(
            "Arguments for '{tool}' must be a JSON object"
        ))),
        Err(e) => Err(AppError::BadRequest(format!(
            "Arguments for '{tool}' are not valid JSON (line {}, column {})",
            e.line(),
            e.column()
        ))),
    }
}

fn decode<T: DeserializeOwned>(tool: Tool, args: &Value) -> AppResult<T> {
    T::deserialize(args).map_err(|e| {
        AppError::BadRequest(format!("Invalid arguments for '{tool}': {}", decode_failure(&e)))
    })
}

/// What went wrong while decoding arguments, without echoing the values.
///
/// serde quotes rejected values in its messages; only a missing field, whose
/// message names nothing but the field, is passed through.
fn decode_failure(err: &serde_json::Error) -> String {
    let message = err.to_string();
    if message.starts_with("missing field") {
        return message;
    }
    match err.classify() {
        Category::Data => "a field has an unsupported type or value".to_string(),
        Category::Syntax | Category::Eof => "malformed arguments".to_string(),
        Category::Io => "unreadable arguments".to_string(),
    }
}

fn to_data<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::InternalError(e.to_string()))
}

/// Route a decoded call to its service operation.
///
/// Update tools take the record id alongside the fields being changed.
async fn dispatch(services: &Services, tool: Tool, args: Value) -> AppResult<Value> {
    let s = services;
    match tool {
        // --- Clients ---
        Tool::CreateClient => to_data(s.clients.create_client(decode(tool, &args)?).await?),
        Tool::GetClient => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.clients.get_client(&id).await?)
        }
        Tool::ListClients => to_data(s.clients.list_clients(decode(tool, &args)?).await?),
        Tool::SearchClients => to_data(s.clients.search_clients(decode(tool, &args)?).await?),
        Tool::UpdateClient => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.clients.update_client(&id, decode(tool, &args)?).await?)
        }
        Tool::DeactivateClient => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.clients.deactivate_client(&id).await?)
        }
        Tool::ReactivateClient => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.clients.reactivate_client(&id).await?)
        }

        // --- Goals ---
        Tool::CreateGoal => to_data(s.goals.create_goal(decode(tool, &args)?).await?),
        Tool::GetGoal => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.goals.get_goal(&id).await?)
        }
        Tool::ListGoals => to_data(s.goals.list_goals(decode(tool, &args)?).await?),
        Tool::UpdateGoal => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.goals.update_goal(&id, decode(tool, &args)?).await?)
        }
        Tool::UpdateGoalProgress => {
            let GoalProgressArgs {
                id,
                progress_percentage,
                status,
            } = decode(tool, &args)?;
            to_data(
                s.goals
                    .update_goal_progress(&id, progress_percentage, status)
                    .await?,
            )
        }
        Tool::ArchiveGoal => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.goals.archive_goal(&id).await?)
        }
        Tool::GetGoalsAtRisk => {
            let GoalsAtRiskArgs { client_id } = decode(tool, &args)?;
            to_data(s.goals.get_goals_at_risk(client_id.as_deref()).await?)
        }

        // --- Activities ---
        Tool::CreateActivity => {
            to_data(s.activities.create_activity(decode(tool, &args)?).await?)
        }
        Tool::GetActivity => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.activities.get_activity(&id).await?)
        }
        Tool::ListActivities => {
            to_data(s.activities.list_activities(decode(tool, &args)?).await?)
        }
        Tool::UpdateActivity => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.activities.update_activity(&id, decode(tool, &args)?).await?)
        }

        // --- Stakeholders ---
        Tool::CreateStakeholder => {
            to_data(s.stakeholders.create_stakeholder(decode(tool, &args)?).await?)
        }
        Tool::GetStakeholder => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.stakeholders.get_stakeholder(&id).await?)
        }
        Tool::ListStakeholders => {
            to_data(s.stakeholders.list_stakeholders(decode(tool, &args)?).await?)
        }
        Tool::UpdateStakeholder => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.stakeholders.update_stakeholder(&id, decode(tool, &args)?).await?)
        }
        Tool::DeactivateStakeholder => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.stakeholders.deactivate_stakeholder(&id).await?)
        }
        Tool::ReactivateStakeholder => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.stakeholders.reactivate_stakeholder(&id).await?)
        }

        // --- Shift notes ---
        Tool::CreateShiftNote => {
            to_data(s.shift_notes.create_shift_note(decode(tool, &args)?).await?)
        }
        Tool::GetShiftNote => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.shift_notes.get_shift_note(&id).await?)
        }
        Tool::ListShiftNotes => {
            to_data(s.shift_notes.list_shift_notes(decode(tool, &args)?).await?)
        }
        Tool::UpdateShiftNote => {
            let IdArgs { id } = decode(tool, &args)?;
            to_data(s.shift_notes.update_shift_note(&id, decode(tool, &args)?).await?)
        }
        Tool::GetRecentShiftNotes => {
            let RecentShiftNotesArgs { client_id, limit } = decode(tool, &args)?;
            to_data(
                s.shift_notes
                    .get_recent_shift_notes(client_id.as_deref(), limit)
                    .await?,
            )
        }

        // --- Dashboard ---
        Tool::GetDashboard => to_data(s.dashboard.get_dashboard().await?),
        Tool::GetClientSummary => {
            let ClientIdArgs { client_id } = decode(tool, &args)?;
            to_data(s.dashboard.get_client_summary(&client_id).await?)
        }

        // --- Maintenance ---
        Tool::CreateBackup => {
            let backup_id = s.maintenance.create_backup().await?;
            Ok(json!({ "backup_id": backup_id }))
        }
        Tool::ListBackups => to_data(s.maintenance.list_backups().await?),
        Tool::RestoreBackup => {
            let BackupArgs { backup_id } = decode(tool, &args)?;
            s.maintenance.restore_backup(&backup_id).await?;
            Ok(json!({ "restored": backup_id }))
        }
        Tool::GetStorageStats => to_data(s.maintenance.get_storage_stats().await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_keep_field_names_but_not_values() {
        let err = decode::<IdArgs>(Tool::GetClient, &json!({})).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));

        let args = json!({ "backup_id": 430123456 });
        let err = decode::<BackupArgs>(Tool::RestoreBackup, &args).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("restore_backup"));
        assert!(!message.contains("430123456"));
    }
}
