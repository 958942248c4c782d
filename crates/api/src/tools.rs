//! The closed catalog of named operations exposed over the API.

use serde::Serialize;

macro_rules! tool_catalog {
    ( $( $variant:ident => $name:literal ),+ $(,)? ) => {
        /// A named operation callable through `POST /api/v1/tools/{name}`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum Tool {
            $( #[serde(rename = $name)] $variant ),+
        }

        impl Tool {
            /// Every tool, in catalog order.
            pub const ALL: &'static [Tool] = &[ $( Tool::$variant ),+ ];

            pub fn name(self) -> &'static str {
                match self {
                    $( Tool::$variant => $name ),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Tool::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

tool_catalog! {
    // Clients
    CreateClient => "create_client",
    GetClient => "get_client",
    ListClients => "list_clients",
    SearchClients => "search_clients",
    UpdateClient => "update_client",
    DeactivateClient => "deactivate_client",
    ReactivateClient => "reactivate_client",
    // Goals
    CreateGoal => "create_goal",
    GetGoal => "get_goal",
    ListGoals => "list_goals",
    UpdateGoal => "update_goal",
    UpdateGoalProgress => "update_goal_progress",
    ArchiveGoal => "archive_goal",
    GetGoalsAtRisk => "get_goals_at_risk",
    // Activities
    CreateActivity => "create_activity",
    GetActivity => "get_activity",
    ListActivities => "list_activities",
    UpdateActivity => "update_activity",
    // Stakeholders
    CreateStakeholder => "create_stakeholder",
    GetStakeholder => "get_stakeholder",
    ListStakeholders => "list_stakeholders",
    UpdateStakeholder => "update_stakeholder",
    DeactivateStakeholder => "deactivate_stakeholder",
    ReactivateStakeholder => "reactivate_stakeholder",
    // Shift notes
    CreateShiftNote => "create_shift_note",
    GetShiftNote => "get_shift_note",
    ListShiftNotes => "list_shift_notes",
    UpdateShiftNote => "update_shift_note",
    GetRecentShiftNotes => "get_recent_shift_notes",
    // Dashboard
    GetDashboard => "get_dashboard",
    GetClientSummary => "get_client_summary",
    // Maintenance
    CreateBackup => "create_backup",
    ListBackups => "list_backups",
    RestoreBackup => "restore_backup",
    GetStorageStats => "get_storage_stats",
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
