//! Goals: creation for active clients, progress and status bookkeeping,
//! archiving and risk detection.

use serde::Serialize;
use validator::Validate;

use caseload_core::error::CoreError;
use caseload_core::goals::{
    days_until_target, is_at_risk, is_overdue, resolve_achieved_at, resolve_status,
    suggest_status, validate_progress, validate_status_progress, validate_target_date,
    GoalStatus,
};
use caseload_core::types::{new_record_id, Date};
use caseload_store::models::goal::{CreateGoal, GoalListParams, UpdateGoal};
use caseload_store::models::{Activity, Client, Goal};
use caseload_store::{ListOptions, RecordFilter, SortOrder};

use crate::context::{
    clean_text, page_options, require_id, required_text, touch, ServiceContext,
};

/// Goal with its client name and derived risk indicators.
#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub client_name: Option<String>,
    pub days_until_target: i64,
    pub at_risk: bool,
    pub overdue: bool,
    pub linked_activity_count: usize,
}

/// Entry in an at-risk report.
#[derive(Debug, Clone, Serialize)]
pub struct AtRiskGoal {
    pub goal_id: String,
    pub client_id: String,
    pub title: String,
    pub status: GoalStatus,
    pub progress_percentage: i32,
    pub target_date: Date,
    pub days_until_target: i64,
}

impl AtRiskGoal {
    pub fn new(goal: &Goal, today: Date) -> Self {
        Self {
            goal_id: goal.id.clone(),
            client_id: goal.client_id.clone(),
            title: goal.title.clone(),
            status: goal.status,
            progress_percentage: goal.progress_percentage,
            target_date: goal.target_date,
            days_until_target: days_until_target(goal.target_date, today),
        }
    }
}

/// Whether a stored goal is currently at risk.
pub fn goal_at_risk(goal: &Goal, today: Date) -> bool {
    !goal.archived && is_at_risk(goal.status, goal.progress_percentage, goal.target_date, today)
}

#[derive(Debug, Clone)]
pub struct GoalService {
    ctx: ServiceContext,
}

impl GoalService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a goal for an active client.
    ///
    /// Without an explicit status the status follows the initial progress
    /// (0 → `not_started`).
    pub async fn create_goal(&self, input: CreateGoal) -> Result<Goal, CoreError> {
        input.validate()?;
        let title = required_text("title", &input.title)?;
        let today = self.ctx.today();
        validate_target_date(input.target_date, today)?;

        let progress = input.progress_percentage.unwrap_or(0);
        validate_progress(progress)?;
        let status = input.status.unwrap_or_else(|| suggest_status(progress));
        validate_status_progress(status, progress)?;

        let client: Client = self.ctx.fetch_ref("client_id", &input.client_id).await?;
        if !client.active {
            return Err(CoreError::Conflict(
                "Goals can only be created for active clients".to_string(),
            ));
        }

        let now = self.ctx.now();
        let goal = Goal {
            id: new_record_id(),
            client_id: client.id,
            title,
            description: clean_text(input.description),
            category: input.category,
            target_date: input.target_date,
            status,
            progress_percentage: progress,
            archived: false,
            achieved_at: (status == GoalStatus::Achieved).then_some(now),
            created_at: now,
            updated_at: now,
        };
        let goal = self.ctx.store.put(goal).await?;

        tracing::info!(
            goal_id = %goal.id,
            client_id = %goal.client_id,
            status = %goal.status,
            "Goal created"
        );
        Ok(goal)
    }

    pub async fn get_goal(&self, id: &str) -> Result<GoalView, CoreError> {
        let goal: Goal = self.ctx.fetch(id).await?;
        let today = self.ctx.today();

        let client = self.ctx.lookup::<Client>(&goal.client_id).await?;
        let goal_id = goal.id.clone();
        let linked_activity_count = self
            .ctx
            .store
            .find::<Activity, _>(|a| a.goal_ids.contains(&goal_id), &ListOptions::default())
            .await?
            .len();

        Ok(GoalView {
            client_name: client.map(|c| c.name),
            days_until_target: days_until_target(goal.target_date, today),
            at_risk: goal_at_risk(&goal, today),
            overdue: !goal.archived && is_overdue(goal.status, goal.target_date, today),
            linked_activity_count,
            goal,
        })
    }

    /// List goals ordered by target date. Archived goals are hidden unless
    /// `include_archived` is set.
    pub async fn list_goals(&self, params: GoalListParams) -> Result<Vec<Goal>, CoreError> {
        if let Some(client_id) = params.client_id.as_deref() {
            require_id("client_id", client_id)?;
        }

        let filter = RecordFilter::new()
            .eq_opt("client_id", params.client_id.clone())
            .eq_opt("status", params.status.map(|s| s.as_str()))
            .eq_opt("category", params.category.map(|c| c.as_str()));
        let filter = if params.include_archived {
            filter
        } else {
            filter.eq("archived", false)
        };
        let options = page_options("target_date", SortOrder::Asc, params.limit, params.offset);

        if !params.at_risk_only {
            return Ok(self.ctx.store.list::<Goal>(&filter, &options).await?);
        }

        // The risk rule depends on today's date, so it cannot be an exact-match filter.
        let today = self.ctx.today();
        let goals = self
            .ctx
            .store
            .find::<Goal, _>(
                |g| {
                    goal_at_risk(g, today)
                        && params.client_id.as_ref().map_or(true, |c| &g.client_id == c)
                        && params.status.map_or(true, |s| g.status == s)
                        && params.category.map_or(true, |c| g.category == c)
                },
                &options,
            )
            .await?;
        Ok(goals)
    }

    /// Apply a partial update.
    ///
    /// A progress change without an explicit status derives the status from
    /// the new progress. Status and progress must agree afterwards, and
    /// `achieved_at` follows transitions into and out of `achieved`.
    pub async fn update_goal(&self, id: &str, input: UpdateGoal) -> Result<Goal, CoreError> {
        let mut goal: Goal = self.ctx.fetch(id).await?;
        if goal.archived {
            return Err(CoreError::Conflict("Archived goals cannot be modified".to_string()));
        }
        input.validate()?;

        if let Some(target_date) = input.target_date {
            if target_date != goal.target_date {
                validate_target_date(target_date, self.ctx.today())?;
            }
            goal.target_date = target_date;
        }

        let previous_status = goal.status;
        let progress = input.progress_percentage.unwrap_or(goal.progress_percentage);
        let status = resolve_status(goal.status, input.status, input.progress_percentage);
        validate_status_progress(status, progress)?;

        let now = self.ctx.now();
        goal.achieved_at = resolve_achieved_at(previous_status, status, goal.achieved_at, now);
        goal.status = status;
        goal.progress_percentage = progress;

        if let Some(title) = input.title {
            goal.title = required_text("title", &title)?;
        }
        if input.description.is_some() {
            goal.description = clean_text(input.description);
        }
        if let Some(category) = input.category {
            goal.category = category;
        }
        goal.updated_at = touch(goal.updated_at, now);

        let goal = self.ctx.store.put(goal).await?;
        tracing::info!(
            goal_id = %goal.id,
            from_status = %previous_status,
            to_status = %goal.status,
            progress = goal.progress_percentage,
            "Goal updated"
        );
        Ok(goal)
    }

    /// Progress-only update; the status follows unless `status` is given.
    pub async fn update_goal_progress(
        &self,
        id: &str,
        progress_percentage: i32,
        status: Option<GoalStatus>,
    ) -> Result<Goal, CoreError> {
        self.update_goal(
            id,
            UpdateGoal {
                progress_percentage: Some(progress_percentage),
                status,
                ..UpdateGoal::default()
            },
        )
        .await
    }

    /// One-way soft delete. Archiving twice is a no-op.
    pub async fn archive_goal(&self, id: &str) -> Result<Goal, CoreError> {
        let mut goal: Goal = self.ctx.fetch(id).await?;
        if goal.archived {
            return Ok(goal);
        }
        goal.archived = true;
        goal.updated_at = touch(goal.updated_at, self.ctx.now());

        let goal = self.ctx.store.put(goal).await?;
        tracing::info!(goal_id = %goal.id, client_id = %goal.client_id, "Goal archived");
        Ok(goal)
    }

    /// At-risk goals, soonest target first, optionally for one client.
    pub async fn get_goals_at_risk(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<AtRiskGoal>, CoreError> {
        if let Some(client_id) = client_id {
            require_id("client_id", client_id)?;
        }
        let today = self.ctx.today();
        let goals = self
            .ctx
            .store
            .find::<Goal, _>(
                |g| goal_at_risk(g, today) && client_id.map_or(true, |c| g.client_id == c),
                &ListOptions::sorted_by("target_date", SortOrder::Asc),
            )
            .await?;
        Ok(goals.iter().map(|g| AtRiskGoal::new(g, today)).collect())
    }
}
