//! Client model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use caseload_core::types::{Date, RecordId, Timestamp};

/// A stored client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: RecordId,
    pub name: String,
    pub date_of_birth: Date,
    pub ndis_number: Option<String>,
    pub primary_contact: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClient {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub date_of_birth: Date,
    pub ndis_number: Option<String>,
    #[validate(length(max = 500))]
    pub primary_contact: Option<String>,
    #[validate(length(max = 500))]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// DTO for updating a client. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClient {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub ndis_number: Option<String>,
    #[validate(length(max = 500))]
    pub primary_contact: Option<String>,
    #[validate(length(max = 500))]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Parameters for listing clients.
///
/// `active` defaults to active clients only; pass `include_inactive` to see all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientListParams {
    pub active: Option<bool>,
    #[serde(default)]
    pub include_inactive: bool,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Parameters for free-text client search over name and NDIS number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientSearchParams {
    pub query: String,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
}
