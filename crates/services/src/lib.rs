//! Business services over the caseload store.
//!
//! Every service holds a [`ServiceContext`] (store, rule limits, clock) and
//! returns [`CoreError`](caseload_core::error::CoreError) on failure.

pub mod activities;
pub mod clients;
pub mod clock;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod goals;
pub mod maintenance;
pub mod shift_notes;
pub mod stakeholders;

mod relations;

pub use activities::ActivityService;
pub use clients::ClientService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RuleConfig;
pub use context::ServiceContext;
pub use dashboard::DashboardService;
pub use goals::GoalService;
pub use maintenance::MaintenanceService;
pub use shift_notes::ShiftNoteService;
pub use stakeholders::StakeholderService;

/// One instance of every service, sharing a single context.
#[derive(Debug, Clone)]
pub struct Services {
    pub clients: ClientService,
    pub goals: GoalService,
    pub activities: ActivityService,
    pub stakeholders: StakeholderService,
    pub shift_notes: ShiftNoteService,
    pub dashboard: DashboardService,
    pub maintenance: MaintenanceService,
}

impl Services {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            clients: ClientService::new(ctx.clone()),
            goals: GoalService::new(ctx.clone()),
            activities: ActivityService::new(ctx.clone()),
            stakeholders: StakeholderService::new(ctx.clone()),
            shift_notes: ShiftNoteService::new(ctx.clone()),
            dashboard: DashboardService::new(ctx.clone()),
            maintenance: MaintenanceService::new(ctx),
        }
    }
}
