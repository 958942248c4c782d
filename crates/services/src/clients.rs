//! Client lifecycle: registration, profile updates, NDIS uniqueness and the
//! deactivation guard.

use serde::Serialize;
use validator::Validate;

use caseload_core::activities::ActivityStatus;
use caseload_core::clients::{
    matches_search, normalize_ndis_number, validate_date_of_birth, validate_ndis_number,
};
use caseload_core::error::CoreError;
use caseload_core::goals::is_active;
use caseload_core::pagination::{clamp_limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use caseload_core::types::{new_record_id, Date};
use caseload_store::models::client::{
    ClientListParams, ClientSearchParams, CreateClient, UpdateClient,
};
use caseload_store::models::{Activity, Client, Goal, ShiftNote};
use caseload_store::{ListOptions, RecordFilter, SortOrder};

use crate::context::{clean_text, page_options, required_text, touch, ServiceContext};

/// Client with the counts and dates shown on a client profile.
#[derive(Debug, Clone, Serialize)]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    pub active_goal_count: usize,
    pub total_goal_count: usize,
    /// Date of the most recent completed activity.
    pub last_activity_date: Option<Date>,
    pub last_shift_date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct ClientService {
    ctx: ServiceContext,
}

impl ClientService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create_client(&self, input: CreateClient) -> Result<Client, CoreError> {
        input.validate()?;
        let name = required_text("name", &input.name)?;
        validate_date_of_birth(input.date_of_birth, self.ctx.today())?;
        let ndis_number = self.checked_ndis(input.ndis_number.as_deref(), None).await?;

        let now = self.ctx.now();
        let client = Client {
            id: new_record_id(),
            name,
            date_of_birth: input.date_of_birth,
            ndis_number,
            primary_contact: clean_text(input.primary_contact),
            emergency_contact: clean_text(input.emergency_contact),
            notes: clean_text(input.notes),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let client = self.ctx.store.put(client).await?;

        tracing::info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn get_client(&self, id: &str) -> Result<ClientView, CoreError> {
        let client: Client = self.ctx.fetch(id).await?;
        let by_client = RecordFilter::new().eq("client_id", id);
        let all = ListOptions::default();

        let (goals, activities, notes) = futures::try_join!(
            self.ctx.store.list::<Goal>(&by_client, &all),
            self.ctx.store.list::<Activity>(&by_client, &all),
            self.ctx.store.list::<ShiftNote>(&by_client, &all),
        )?;

        let active_goal_count = goals
            .iter()
            .filter(|g| is_active(g.status, g.archived))
            .count();
        let last_activity_date = activities
            .iter()
            .filter(|a| a.status == ActivityStatus::Completed)
            .map(|a| a.activity_date)
            .max();
        let last_shift_date = notes.iter().map(|n| n.shift_date).max();

        Ok(ClientView {
            client,
            active_goal_count,
            total_goal_count: goals.len(),
            last_activity_date,
            last_shift_date,
        })
    }

    /// List clients sorted by name. Active clients only unless
    /// `include_inactive` is set or `active` is given explicitly.
    pub async fn list_clients(&self, params: ClientListParams) -> Result<Vec<Client>, CoreError> {
        let active = if params.include_inactive {
            None
        } else {
            Some(params.active.unwrap_or(true))
        };
        let term = params.search.unwrap_or_default();
        let options = page_options("name", SortOrder::Asc, params.limit, params.offset);

        let clients = self
            .ctx
            .store
            .find::<Client, _>(
                |c| {
                    active.map_or(true, |a| c.active == a)
                        && matches_search(&c.name, c.ndis_number.as_deref(), &term)
                },
                &options,
            )
            .await?;
        Ok(clients)
    }

    /// Case-insensitive substring search over name and NDIS number.
    pub async fn search_clients(
        &self,
        params: ClientSearchParams,
    ) -> Result<Vec<Client>, CoreError> {
        let term = params.query.trim().to_string();
        if term.is_empty() {
            return Err(CoreError::invalid_field("query", "Search query cannot be empty"));
        }
        let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT) as usize;
        let include_inactive = params.include_inactive;

        let clients = self
            .ctx
            .store
            .find::<Client, _>(
                |c| {
                    (include_inactive || c.active)
                        && matches_search(&c.name, c.ndis_number.as_deref(), &term)
                },
                &ListOptions::sorted_by("name", SortOrder::Asc).with_limit(limit),
            )
            .await?;
        Ok(clients)
    }

    pub async fn update_client(&self, id: &str, input: UpdateClient) -> Result<Client, CoreError> {
        let mut client: Client = self.ctx.fetch(id).await?;
        input.validate()?;

        if let Some(dob) = input.date_of_birth {
            validate_date_of_birth(dob, self.ctx.today())?;
            client.date_of_birth = dob;
        }
        if let Some(raw) = input.ndis_number.as_deref() {
            // Uniqueness only binds active clients; reactivation re-checks it.
            let exclude = Some(client.id.as_str());
            client.ndis_number = if client.active {
                self.checked_ndis(Some(raw), exclude).await?
            } else {
                normalized_ndis(raw)?
            };
        }
        if let Some(name) = input.name {
            client.name = required_text("name", &name)?;
        }
        if input.primary_contact.is_some() {
            client.primary_contact = clean_text(input.primary_contact);
        }
        if input.emergency_contact.is_some() {
            client.emergency_contact = clean_text(input.emergency_contact);
        }
        if input.notes.is_some() {
            client.notes = clean_text(input.notes);
        }
        client.updated_at = touch(client.updated_at, self.ctx.now());

        let client = self.ctx.store.put(client).await?;
        tracing::info!(client_id = %client.id, "Client updated");
        Ok(client)
    }

    /// Soft-delete a client.
    ///
    /// Blocked while the client has any non-archived goal. The goal check and
    /// the client write are not atomic across the two collections.
    pub async fn deactivate_client(&self, id: &str) -> Result<Client, CoreError> {
        let mut client: Client = self.ctx.fetch(id).await?;
        if !client.active {
            return Ok(client);
        }

        let blocking = self
            .ctx
            .store
            .count::<Goal>(&RecordFilter::new().eq("client_id", id).eq("archived", false))
            .await?;
        if blocking > 0 {
            return Err(CoreError::Conflict(format!(
                "Client has {blocking} non-archived goal(s); archive them before deactivating"
            )));
        }

        client.active = false;
        client.updated_at = touch(client.updated_at, self.ctx.now());
        let client = self.ctx.store.put(client).await?;

        tracing::info!(client_id = %client.id, "Client deactivated");
        Ok(client)
    }

    /// Reverse a deactivation. The NDIS number must still be unique among
    /// active clients.
    pub async fn reactivate_client(&self, id: &str) -> Result<Client, CoreError> {
        let mut client: Client = self.ctx.fetch(id).await?;
        if client.active {
            return Ok(client);
        }
        if let Some(ndis) = client.ndis_number.clone() {
            self.ensure_ndis_available(&ndis, Some(&client.id)).await?;
        }

        client.active = true;
        client.updated_at = touch(client.updated_at, self.ctx.now());
        let client = self.ctx.store.put(client).await?;

        tracing::info!(client_id = %client.id, "Client reactivated");
        Ok(client)
    }

    // -- NDIS helpers --------------------------------------------------------

    /// Normalize, validate and uniqueness-check an optional NDIS number.
    async fn checked_ndis(
        &self,
        raw: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<Option<String>, CoreError> {
        let Some(ndis) = raw.map(normalized_ndis).transpose()?.flatten() else {
            return Ok(None);
        };
        self.ensure_ndis_available(&ndis, exclude_id).await?;
        Ok(Some(ndis))
    }

    async fn ensure_ndis_available(
        &self,
        ndis: &str,
        exclude_id: Option<&str>,
    ) -> Result<(), CoreError> {
        let taken = self
            .ctx
            .store
            .find::<Client, _>(
                |c| {
                    c.active
                        && c.ndis_number.as_deref() == Some(ndis)
                        && Some(c.id.as_str()) != exclude_id
                },
                &ListOptions::default().with_limit(1),
            )
            .await?;
        if !taken.is_empty() {
            return Err(CoreError::Conflict(
                "An active client with this NDIS number already exists".to_string(),
            ));
        }
        Ok(())
    }
}

/// Blank input clears the number; anything else must be nine digits.
fn normalized_ndis(raw: &str) -> Result<Option<String>, CoreError> {
    let ndis = normalize_ndis_number(raw);
    if ndis.is_empty() {
        return Ok(None);
    }
    validate_ndis_number(&ndis)?;
    Ok(Some(ndis))
}
