//! Stakeholder roles and search matching.

pub const MAX_STAKEHOLDER_NAME_LENGTH: u64 = 200;

define_label_enum! {
    /// Relationship of a stakeholder to the people being supported.
    StakeholderRole {
        SupportWorker => "support_worker",
        SupportCoordinator => "support_coordinator",
        PlanManager => "plan_manager",
        FamilyMember => "family_member",
        Guardian => "guardian",
        Therapist => "therapist",
        Other => "other",
    }
}

/// Case-insensitive substring match over name and organization.
pub fn matches_search(name: &str, organization: Option<&str>, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&term)
        || organization.is_some_and(|o| o.to_lowercase().contains(&term))
}
