//! Activities delivered to a client by a stakeholder, optionally linked to
//! the client's goals.

use std::cmp::Ordering;

use serde::Serialize;
use validator::Validate;

use caseload_core::activities::{resolve_duration, validate_activity_date, ActivityStatus};
use caseload_core::error::CoreError;
use caseload_core::temporal::within_range;
use caseload_core::types::{new_record_id, RecordId};
use caseload_store::models::activity::{ActivityListParams, CreateActivity, UpdateActivity};
use caseload_store::models::{Activity, Client, Goal, Stakeholder};
use caseload_store::SortOrder;

use crate::context::{
    clean_text, page_options, require_id, required_text, touch, ServiceContext,
};
use crate::relations::{active_client, active_stakeholder, dedupe_ids, goals_of_client};

/// Goal id and title, as shown next to an activity.
#[derive(Debug, Clone, Serialize)]
pub struct GoalRef {
    pub id: RecordId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub client_name: Option<String>,
    pub stakeholder_name: Option<String>,
    pub goals: Vec<GoalRef>,
}

/// Most recent first: activity date, then creation time, both descending.
pub fn newest_first(a: &Activity, b: &Activity) -> Ordering {
    b.activity_date
        .cmp(&a.activity_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[derive(Debug, Clone)]
pub struct ActivityService {
    ctx: ServiceContext,
}

impl ActivityService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Record an activity for an active client and stakeholder.
    ///
    /// Linked goals must belong to the same client. `status` defaults to
    /// `scheduled`; the duration is derived from the times when omitted.
    pub async fn create_activity(&self, input: CreateActivity) -> Result<Activity, CoreError> {
        input.validate()?;
        let title = required_text("title", &input.title)?;
        let status = input.status.unwrap_or(ActivityStatus::Scheduled);
        validate_activity_date(
            input.activity_date,
            status,
            self.ctx.today(),
            self.ctx.rules.activity_max_backdate_days,
        )?;
        let duration_minutes =
            resolve_duration(input.start_time, input.end_time, input.duration_minutes)?;

        let client = active_client(&self.ctx, &input.client_id).await?;
        let stakeholder = active_stakeholder(&self.ctx, &input.stakeholder_id).await?;
        let goal_ids = dedupe_ids(input.goal_ids);
        goals_of_client(&self.ctx, &client.id, &goal_ids, "goal_ids").await?;

        let now = self.ctx.now();
        let activity = Activity {
            id: new_record_id(),
            client_id: client.id,
            stakeholder_id: stakeholder.id,
            title,
            description: clean_text(input.description),
            activity_type: input.activity_type,
            activity_date: input.activity_date,
            start_time: input.start_time,
            end_time: input.end_time,
            duration_minutes,
            status,
            goal_ids,
            location: clean_text(input.location),
            outcome_notes: clean_text(input.outcome_notes),
            created_at: now,
            updated_at: now,
        };
        let activity = self.ctx.store.put(activity).await?;

        tracing::info!(
            activity_id = %activity.id,
            client_id = %activity.client_id,
            stakeholder_id = %activity.stakeholder_id,
            status = %activity.status,
            goal_count = activity.goal_ids.len(),
            "Activity created"
        );
        Ok(activity)
    }

    pub async fn get_activity(&self, id: &str) -> Result<ActivityView, CoreError> {
        let activity: Activity = self.ctx.fetch(id).await?;

        let (client, stakeholder) = futures::try_join!(
            self.ctx.lookup::<Client>(&activity.client_id),
            self.ctx.lookup::<Stakeholder>(&activity.stakeholder_id),
        )?;

        let mut goals = Vec::with_capacity(activity.goal_ids.len());
        for goal_id in &activity.goal_ids {
            if let Some(goal) = self.ctx.lookup::<Goal>(goal_id).await? {
                goals.push(GoalRef {
                    id: goal.id,
                    title: goal.title,
                });
            }
        }

        Ok(ActivityView {
            client_name: client.map(|c| c.name),
            stakeholder_name: stakeholder.map(|s| s.name),
            goals,
            activity,
        })
    }

    /// List activities, newest first.
    pub async fn list_activities(
        &self,
        params: ActivityListParams,
    ) -> Result<Vec<Activity>, CoreError> {
        for (field, id) in [
            ("client_id", params.client_id.as_deref()),
            ("stakeholder_id", params.stakeholder_id.as_deref()),
            ("goal_id", params.goal_id.as_deref()),
        ] {
            if let Some(id) = id {
                require_id(field, id)?;
            }
        }
        if let (Some(from), Some(to)) = (params.date_from, params.date_to) {
            if from > to {
                return Err(CoreError::invalid_field(
                    "date_from",
                    "date_from must not be after date_to",
                ));
            }
        }

        let options = page_options("activity_date", SortOrder::Desc, params.limit, params.offset);
        let activities = self
            .ctx
            .store
            .find::<Activity, _>(
                |a| {
                    params.client_id.as_ref().map_or(true, |c| &a.client_id == c)
                        && params.stakeholder_id.as_ref().map_or(true, |s| &a.stakeholder_id == s)
                        && params.status.map_or(true, |s| a.status == s)
                        && params.activity_type.map_or(true, |t| a.activity_type == t)
                        && params.goal_id.as_ref().map_or(true, |g| a.goal_ids.contains(g))
                        && within_range(a.activity_date, params.date_from, params.date_to)
                },
                &options,
            )
            .await?;
        Ok(activities)
    }

    /// Apply a partial update, re-checking every rule the change touches.
    ///
    /// A new client or stakeholder must be active, and linked goals are
    /// re-checked against the effective client whenever either changes.
    pub async fn update_activity(
        &self,
        id: &str,
        input: UpdateActivity,
    ) -> Result<Activity, CoreError> {
        let mut activity: Activity = self.ctx.fetch(id).await?;
        input.validate()?;

        let client_changed = input
            .client_id
            .as_ref()
            .is_some_and(|c| *c != activity.client_id);
        if client_changed {
            if let Some(client_id) = input.client_id.as_deref() {
                activity.client_id = active_client(&self.ctx, client_id).await?.id;
            }
        }
        if let Some(stakeholder_id) = input.stakeholder_id.as_deref() {
            if stakeholder_id != activity.stakeholder_id {
                activity.stakeholder_id = active_stakeholder(&self.ctx, stakeholder_id).await?.id;
            }
        }

        let goals_changed = input.goal_ids.is_some();
        if let Some(goal_ids) = input.goal_ids {
            activity.goal_ids = dedupe_ids(goal_ids);
        }
        if client_changed || goals_changed {
            goals_of_client(&self.ctx, &activity.client_id, &activity.goal_ids, "goal_ids")
                .await?;
        }

        let date_changed = input.activity_date.is_some() || input.status.is_some();
        if let Some(date) = input.activity_date {
            activity.activity_date = date;
        }
        if let Some(status) = input.status {
            activity.status = status;
        }
        if date_changed {
            validate_activity_date(
                activity.activity_date,
                activity.status,
                self.ctx.today(),
                self.ctx.rules.activity_max_backdate_days,
            )?;
        }

        let times_changed = input.start_time.is_some() || input.end_time.is_some();
        if times_changed || input.duration_minutes.is_some() {
            let start = input.start_time.or(activity.start_time);
            let end = input.end_time.or(activity.end_time);
            // New times re-derive the duration unless one is given alongside.
            let duration = match input.duration_minutes {
                Some(d) => Some(d),
                None if times_changed => None,
                None => activity.duration_minutes,
            };
            activity.duration_minutes = resolve_duration(start, end, duration)?;
            activity.start_time = start;
            activity.end_time = end;
        }

        if let Some(title) = input.title {
            activity.title = required_text("title", &title)?;
        }
        if let Some(activity_type) = input.activity_type {
            activity.activity_type = activity_type;
        }
        if input.description.is_some() {
            activity.description = clean_text(input.description);
        }
        if input.location.is_some() {
            activity.location = clean_text(input.location);
        }
        if input.outcome_notes.is_some() {
            activity.outcome_notes = clean_text(input.outcome_notes);
        }
        activity.updated_at = touch(activity.updated_at, self.ctx.now());

        let activity = self.ctx.store.put(activity).await?;
        tracing::info!(
            activity_id = %activity.id,
            client_id = %activity.client_id,
            status = %activity.status,
            "Activity updated"
        );
        Ok(activity)
    }
}
