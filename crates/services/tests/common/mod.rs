#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use caseload_core::activities::{ActivityStatus, ActivityType};
use caseload_core::goals::GoalCategory;
use caseload_core::stakeholders::StakeholderRole;
use caseload_core::types::{Date, RecordId, Timestamp};
use caseload_services::{FixedClock, RuleConfig, ServiceContext, Services};
use caseload_store::models::activity::CreateActivity;
use caseload_store::models::client::CreateClient;
use caseload_store::models::goal::CreateGoal;
use caseload_store::models::shift_note::{CreateShiftNote, GoalProgressEntry};
use caseload_store::models::stakeholder::CreateStakeholder;
use caseload_store::models::{Client, Stakeholder};
use caseload_store::{StorageBackendKind, Store, StoreConfig};

/// Wednesday 2024-06-12 10:00 UTC. The surrounding week runs 06-10..06-16.
pub fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap()
}

pub fn today() -> Date {
    start().date_naive()
}

pub fn date(y: i32, m: u32, d: u32) -> Date {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub struct Harness {
    pub services: Services,
    pub clock: Arc<FixedClock>,
    pub store: Store,
}

fn build(store: Store) -> Harness {
    let clock = Arc::new(FixedClock::new(start()));
    let ctx = ServiceContext::new(store.clone(), RuleConfig::default(), clock.clone());
    Harness {
        services: Services::new(ctx),
        clock,
        store,
    }
}

/// Services over an in-memory store and a fixed clock.
pub async fn harness() -> Harness {
    let store = Store::open(&StoreConfig::memory()).await.unwrap();
    build(store)
}

/// Services over a JSON store in a fresh temp directory.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub async fn json_harness() -> (tempfile::TempDir, Harness) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        backend: StorageBackendKind::Json,
        data_dir: dir.path().to_path_buf(),
        ..StoreConfig::default()
    };
    let store = Store::open(&config).await.unwrap();
    (dir, build(store))
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

pub fn new_client(name: &str) -> CreateClient {
    CreateClient {
        name: name.to_string(),
        date_of_birth: date(1990, 1, 1),
        ndis_number: None,
        primary_contact: None,
        emergency_contact: None,
        notes: None,
    }
}

pub fn new_stakeholder(name: &str) -> CreateStakeholder {
    CreateStakeholder {
        name: name.to_string(),
        role: StakeholderRole::SupportWorker,
        email: None,
        phone: None,
        organization: None,
        notes: None,
    }
}

pub fn new_goal(client_id: &str, title: &str, target_date: Date) -> CreateGoal {
    CreateGoal {
        client_id: client_id.to_string(),
        title: title.to_string(),
        description: None,
        category: GoalCategory::DailyLiving,
        target_date,
        status: None,
        progress_percentage: None,
    }
}

pub fn new_activity(client_id: &str, stakeholder_id: &str, activity_date: Date) -> CreateActivity {
    CreateActivity {
        client_id: client_id.to_string(),
        stakeholder_id: stakeholder_id.to_string(),
        title: "Grocery shopping".to_string(),
        description: None,
        activity_type: ActivityType::LifeSkills,
        activity_date,
        start_time: None,
        end_time: None,
        duration_minutes: None,
        status: None,
        goal_ids: Vec::new(),
        location: None,
        outcome_notes: None,
    }
}

pub fn completed_activity(
    client_id: &str,
    stakeholder_id: &str,
    activity_date: Date,
    goal_ids: Vec<RecordId>,
) -> CreateActivity {
    CreateActivity {
        status: Some(ActivityStatus::Completed),
        start_time: Some(time(9, 0)),
        end_time: Some(time(11, 0)),
        goal_ids,
        ..new_activity(client_id, stakeholder_id, activity_date)
    }
}

pub fn new_shift_note(client_id: &str, stakeholder_id: &str, shift_date: Date) -> CreateShiftNote {
    CreateShiftNote {
        client_id: client_id.to_string(),
        stakeholder_id: stakeholder_id.to_string(),
        shift_date,
        start_time: time(9, 0),
        end_time: time(15, 0),
        general_observations: "Settled and engaged throughout the shift.".to_string(),
        activity_ids: Vec::new(),
        goals_progress: Vec::new(),
        challenges: None,
        next_steps: None,
    }
}

pub fn progress_entry(goal_id: &str, rating: i32) -> GoalProgressEntry {
    GoalProgressEntry {
        goal_id: goal_id.to_string(),
        progress_notes: "Made a list before leaving".to_string(),
        progress_observed: rating,
    }
}

// ---------------------------------------------------------------------------
// Persisted fixtures
// ---------------------------------------------------------------------------

pub async fn client(h: &Harness, name: &str) -> Client {
    h.services.clients.create_client(new_client(name)).await.unwrap()
}

pub async fn stakeholder(h: &Harness, name: &str) -> Stakeholder {
    h.services
        .stakeholders
        .create_stakeholder(new_stakeholder(name))
        .await
        .unwrap()
}
