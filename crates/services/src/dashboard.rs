//! Read-only aggregation across every collection.
//!
//! Each call scans the collections in full; nothing is indexed or cached.

use std::collections::BTreeMap;

use serde::Serialize;

use caseload_core::activities::{is_upcoming, ActivityStatus};
use caseload_core::error::CoreError;
use caseload_core::goals::{days_until_target, is_active, GoalStatus};
use caseload_core::pagination::DASHBOARD_RECENT_LIMIT;
use caseload_core::temporal::{week_bounds, within_range};
use caseload_core::types::{Date, RecordId, Timestamp};
use caseload_store::models::{Activity, Client, Goal, ShiftNote, Stakeholder};
use caseload_store::{ListOptions, RecordFilter};

use crate::activities;
use crate::context::ServiceContext;
use crate::goals::{goal_at_risk, AtRiskGoal};
use crate::shift_notes;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: Timestamp,
    pub week_start: Date,
    pub week_end: Date,
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_stakeholders: usize,
    pub total_active_goals: usize,
    pub activities_this_week: usize,
    pub shift_notes_this_week: usize,
    /// Non-archived goals per status; every status is present.
    pub goal_status_counts: BTreeMap<&'static str, usize>,
    pub goals_at_risk: Vec<AtRiskGoal>,
    pub recent_activities: Vec<Activity>,
    pub upcoming_activities: Vec<Activity>,
    pub recent_shift_notes: Vec<ShiftNote>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub goal_id: RecordId,
    pub title: String,
    pub status: GoalStatus,
    pub progress_percentage: i32,
    pub target_date: Date,
    pub days_until_target: i64,
    pub at_risk: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub client_id: RecordId,
    pub client_name: String,
    pub active: bool,
    pub active_goal_count: usize,
    pub completed_activities_this_week: usize,
    pub last_shift_date: Option<Date>,
    pub goals: Vec<GoalProgress>,
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    ctx: ServiceContext,
}

impl DashboardService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_dashboard(&self) -> Result<Dashboard, CoreError> {
        let store = &self.ctx.store;
        let (clients, goals, mut activities, mut notes, stakeholders) = futures::try_join!(
            store.all::<Client>(),
            store.all::<Goal>(),
            store.all::<Activity>(),
            store.all::<ShiftNote>(),
            store.all::<Stakeholder>(),
        )?;

        let now = self.ctx.now();
        let today = now.date_naive();
        let (week_start, week_end) = week_bounds(today);
        let in_week = |date: Date| within_range(date, Some(week_start), Some(week_end));

        let live_goals: Vec<&Goal> = goals.iter().filter(|g| !g.archived).collect();
        let mut goal_status_counts: BTreeMap<&'static str, usize> =
            GoalStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for goal in &live_goals {
            *goal_status_counts.entry(goal.status.as_str()).or_default() += 1;
        }

        let mut at_risk: Vec<&Goal> = live_goals
            .iter()
            .copied()
            .filter(|g| goal_at_risk(g, today))
            .collect();
        at_risk.sort_by_key(|g| g.target_date);

        let mut upcoming: Vec<Activity> = activities
            .iter()
            .filter(|a| is_upcoming(a.status, a.activity_date, today))
            .cloned()
            .collect();
        upcoming.sort_by(|a, b| {
            a.activity_date
                .cmp(&b.activity_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let activities_this_week = activities.iter().filter(|a| in_week(a.activity_date)).count();
        let shift_notes_this_week = notes.iter().filter(|n| in_week(n.shift_date)).count();

        activities.sort_by(activities::newest_first);
        activities.truncate(DASHBOARD_RECENT_LIMIT);
        notes.sort_by(shift_notes::newest_first);
        notes.truncate(DASHBOARD_RECENT_LIMIT);

        Ok(Dashboard {
            generated_at: now,
            week_start,
            week_end,
            total_clients: clients.len(),
            active_clients: clients.iter().filter(|c| c.active).count(),
            total_stakeholders: stakeholders.len(),
            total_active_goals: live_goals
                .iter()
                .filter(|g| is_active(g.status, g.archived))
                .count(),
            activities_this_week,
            shift_notes_this_week,
            goal_status_counts,
            goals_at_risk: at_risk.into_iter().map(|g| AtRiskGoal::new(g, today)).collect(),
            recent_activities: activities,
            upcoming_activities: upcoming,
            recent_shift_notes: notes,
        })
    }

    pub async fn get_client_summary(&self, client_id: &str) -> Result<ClientSummary, CoreError> {
        let client: Client = self.ctx.fetch_ref("client_id", client_id).await?;
        let store = &self.ctx.store;
        let by_client = RecordFilter::new().eq("client_id", client_id);
        let all = ListOptions::default();
        let (goals, activities, notes) = futures::try_join!(
            store.list::<Goal>(&by_client, &all),
            store.list::<Activity>(&by_client, &all),
            store.list::<ShiftNote>(&by_client, &all),
        )?;

        let today = self.ctx.today();
        let (week_start, week_end) = week_bounds(today);

        let mut live_goals: Vec<&Goal> = goals.iter().filter(|g| !g.archived).collect();
        live_goals.sort_by_key(|g| g.target_date);

        Ok(ClientSummary {
            client_id: client.id,
            client_name: client.name,
            active: client.active,
            active_goal_count: live_goals
                .iter()
                .filter(|g| is_active(g.status, g.archived))
                .count(),
            completed_activities_this_week: activities
                .iter()
                .filter(|a| {
                    a.status == ActivityStatus::Completed
                        && within_range(a.activity_date, Some(week_start), Some(week_end))
                })
                .count(),
            last_shift_date: notes.iter().map(|n| n.shift_date).max(),
            goals: live_goals
                .into_iter()
                .map(|g| GoalProgress {
                    goal_id: g.id.clone(),
                    title: g.title.clone(),
                    status: g.status,
                    progress_percentage: g.progress_percentage,
                    target_date: g.target_date,
                    days_until_target: days_until_target(g.target_date, today),
                    at_risk: goal_at_risk(g, today),
                })
                .collect(),
        })
    }
}
