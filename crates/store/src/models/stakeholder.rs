//! Stakeholder model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use caseload_core::stakeholders::StakeholderRole;
use caseload_core::types::{RecordId, Timestamp};

/// A stored stakeholder record (support workers, coordinators, family, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub id: RecordId,
    pub name: String,
    pub role: StakeholderRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new stakeholder.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStakeholder {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub role: StakeholderRole,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub organization: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// DTO for updating a stakeholder.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStakeholder {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub role: Option<StakeholderRole>,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub organization: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Parameters for listing stakeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StakeholderListParams {
    pub role: Option<StakeholderRole>,
    pub active: Option<bool>,
    #[serde(default)]
    pub include_inactive: bool,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
