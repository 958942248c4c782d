//! Cross-entity reference checks shared by the activity and shift note services.
//!
//! Each check reads the referenced collection and then returns; nothing here
//! holds a lock across collections.

use std::collections::HashSet;

use caseload_core::error::CoreError;
use caseload_core::types::RecordId;
use caseload_store::models::{Activity, Client, Goal, Stakeholder};

use crate::context::ServiceContext;

/// Existing client that is still active.
pub(crate) async fn active_client(
    ctx: &ServiceContext,
    client_id: &str,
) -> Result<Client, CoreError> {
    let client: Client = ctx.fetch_ref("client_id", client_id).await?;
    if !client.active {
        return Err(CoreError::Conflict(format!("Client {client_id} is inactive")));
    }
    Ok(client)
}

/// Existing stakeholder that is still active.
pub(crate) async fn active_stakeholder(
    ctx: &ServiceContext,
    stakeholder_id: &str,
) -> Result<Stakeholder, CoreError> {
    let stakeholder: Stakeholder = ctx.fetch_ref("stakeholder_id", stakeholder_id).await?;
    if !stakeholder.active {
        return Err(CoreError::Conflict(format!("Stakeholder {stakeholder_id} is inactive")));
    }
    Ok(stakeholder)
}

/// Every goal exists and belongs to `client_id`.
pub(crate) async fn goals_of_client(
    ctx: &ServiceContext,
    client_id: &str,
    goal_ids: &[RecordId],
    field: &str,
) -> Result<Vec<Goal>, CoreError> {
    let mut goals = Vec::with_capacity(goal_ids.len());
    for goal_id in goal_ids {
        let goal: Goal = ctx.fetch_ref(field, goal_id).await?;
        if goal.client_id != client_id {
            return Err(CoreError::Conflict(format!(
                "Goal {goal_id} belongs to a different client"
            )));
        }
        goals.push(goal);
    }
    Ok(goals)
}

/// Every activity exists and belongs to `client_id`.
pub(crate) async fn activities_of_client(
    ctx: &ServiceContext,
    client_id: &str,
    activity_ids: &[RecordId],
) -> Result<Vec<Activity>, CoreError> {
    let mut activities = Vec::with_capacity(activity_ids.len());
    for activity_id in activity_ids {
        let activity: Activity = ctx.fetch_ref("activity_ids", activity_id).await?;
        if activity.client_id != client_id {
            return Err(CoreError::Conflict(format!(
                "Activity {activity_id} belongs to a different client"
            )));
        }
        activities.push(activity);
    }
    Ok(activities)
}

/// Drop repeated ids, keeping first occurrences in order.
pub(crate) fn dedupe_ids(ids: Vec<RecordId>) -> Vec<RecordId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
