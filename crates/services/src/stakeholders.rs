//! Stakeholders: the people and organisations around a client. Soft-delete only.

use serde::Serialize;
use validator::Validate;

use caseload_core::error::CoreError;
use caseload_core::stakeholders::matches_search;
use caseload_core::types::new_record_id;
use caseload_store::models::stakeholder::{
    CreateStakeholder, StakeholderListParams, UpdateStakeholder,
};
use caseload_store::models::{Activity, ShiftNote, Stakeholder};
use caseload_store::{RecordFilter, SortOrder};

use crate::context::{clean_text, page_options, required_text, touch, ServiceContext};

#[derive(Debug, Clone, Serialize)]
pub struct StakeholderView {
    #[serde(flatten)]
    pub stakeholder: Stakeholder,
    pub activity_count: usize,
    pub shift_note_count: usize,
}

#[derive(Debug, Clone)]
pub struct StakeholderService {
    ctx: ServiceContext,
}

impl StakeholderService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create_stakeholder(
        &self,
        input: CreateStakeholder,
    ) -> Result<Stakeholder, CoreError> {
        input.validate()?;
        let name = required_text("name", &input.name)?;

        let now = self.ctx.now();
        let stakeholder = Stakeholder {
            id: new_record_id(),
            name,
            role: input.role,
            email: clean_text(input.email),
            phone: clean_text(input.phone),
            organization: clean_text(input.organization),
            notes: clean_text(input.notes),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let stakeholder = self.ctx.store.put(stakeholder).await?;

        tracing::info!(
            stakeholder_id = %stakeholder.id,
            role = %stakeholder.role,
            "Stakeholder created"
        );
        Ok(stakeholder)
    }

    pub async fn get_stakeholder(&self, id: &str) -> Result<StakeholderView, CoreError> {
        let stakeholder: Stakeholder = self.ctx.fetch(id).await?;
        let by_stakeholder = RecordFilter::new().eq("stakeholder_id", id);

        let (activity_count, shift_note_count) = futures::try_join!(
            self.ctx.store.count::<Activity>(&by_stakeholder),
            self.ctx.store.count::<ShiftNote>(&by_stakeholder),
        )?;

        Ok(StakeholderView {
            stakeholder,
            activity_count,
            shift_note_count,
        })
    }

    /// List stakeholders by name; active only unless told otherwise.
    pub async fn list_stakeholders(
        &self,
        params: StakeholderListParams,
    ) -> Result<Vec<Stakeholder>, CoreError> {
        let active = if params.include_inactive {
            None
        } else {
            Some(params.active.unwrap_or(true))
        };
        let role = params.role;
        let term = params.search.unwrap_or_default();
        let options = page_options("name", SortOrder::Asc, params.limit, params.offset);

        let stakeholders = self
            .ctx
            .store
            .find::<Stakeholder, _>(
                |s| {
                    active.map_or(true, |a| s.active == a)
                        && role.map_or(true, |r| s.role == r)
                        && matches_search(&s.name, s.organization.as_deref(), &term)
                },
                &options,
            )
            .await?;
        Ok(stakeholders)
    }

    pub async fn update_stakeholder(
        &self,
        id: &str,
        input: UpdateStakeholder,
    ) -> Result<Stakeholder, CoreError> {
        let mut stakeholder: Stakeholder = self.ctx.fetch(id).await?;
        input.validate()?;

        if let Some(name) = input.name {
            stakeholder.name = required_text("name", &name)?;
        }
        if let Some(role) = input.role {
            stakeholder.role = role;
        }
        if input.email.is_some() {
            stakeholder.email = clean_text(input.email);
        }
        if input.phone.is_some() {
            stakeholder.phone = clean_text(input.phone);
        }
        if input.organization.is_some() {
            stakeholder.organization = clean_text(input.organization);
        }
        if input.notes.is_some() {
            stakeholder.notes = clean_text(input.notes);
        }
        stakeholder.updated_at = touch(stakeholder.updated_at, self.ctx.now());

        let stakeholder = self.ctx.store.put(stakeholder).await?;
        tracing::info!(stakeholder_id = %stakeholder.id, "Stakeholder updated");
        Ok(stakeholder)
    }

    /// Existing activities and notes keep their reference; new ones are refused.
    pub async fn deactivate_stakeholder(&self, id: &str) -> Result<Stakeholder, CoreError> {
        self.set_active(id, false).await
    }

    pub async fn reactivate_stakeholder(&self, id: &str) -> Result<Stakeholder, CoreError> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<Stakeholder, CoreError> {
        let mut stakeholder: Stakeholder = self.ctx.fetch(id).await?;
        if stakeholder.active == active {
            return Ok(stakeholder);
        }
        stakeholder.active = active;
        stakeholder.updated_at = touch(stakeholder.updated_at, self.ctx.now());

        let stakeholder = self.ctx.store.put(stakeholder).await?;
        tracing::info!(stakeholder_id = %stakeholder.id, active, "Stakeholder status changed");
        Ok(stakeholder)
    }
}
