//! Shift notes: a stakeholder's record of one shift with a client.
//!
//! Notes stay editable for a fixed window after the start of the shift date
//! and are immutable afterwards.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use validator::Validate;

use caseload_core::error::CoreError;
use caseload_core::shift_notes::{
    edit_anchor, edit_window_closes_at, ensure_editable, is_within_edit_window,
    validate_observations, validate_progress_rating, validate_shift_times, DEFAULT_RECENT_LIMIT,
};
use caseload_core::temporal::{ensure_not_future, ensure_within_backdate, within_range};
use caseload_core::types::{new_record_id, Timestamp};
use caseload_store::models::shift_note::{
    CreateShiftNote, GoalProgressEntry, ShiftNoteListParams, UpdateShiftNote,
};
use caseload_store::models::{Client, ShiftNote, Stakeholder};
use caseload_store::{ListOptions, SortOrder};

use crate::context::{clean_text, page_options, require_id, touch, ServiceContext};
use crate::relations::{
    active_client, active_stakeholder, activities_of_client, dedupe_ids, goals_of_client,
};

#[derive(Debug, Clone, Serialize)]
pub struct ShiftNoteView {
    #[serde(flatten)]
    pub note: ShiftNote,
    pub client_name: Option<String>,
    pub stakeholder_name: Option<String>,
    pub editable: bool,
    pub edit_window_closes_at: Timestamp,
}

/// Most recent first: shift date, then creation time, both descending.
pub fn newest_first(a: &ShiftNote, b: &ShiftNote) -> Ordering {
    b.shift_date
        .cmp(&a.shift_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[derive(Debug, Clone)]
pub struct ShiftNoteService {
    ctx: ServiceContext,
}

impl ShiftNoteService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create_shift_note(&self, input: CreateShiftNote) -> Result<ShiftNote, CoreError> {
        input.validate()?;
        let today = self.ctx.today();
        ensure_not_future("shift_date", input.shift_date, today)?;
        ensure_within_backdate(
            "shift_date",
            input.shift_date,
            today,
            self.ctx.rules.shift_note_max_backdate_days,
        )?;
        let duration_minutes = validate_shift_times(input.start_time, input.end_time)?;
        validate_observations(&input.general_observations)?;
        validate_goal_entries(&input.goals_progress)?;

        let client = active_client(&self.ctx, &input.client_id).await?;
        let stakeholder = active_stakeholder(&self.ctx, &input.stakeholder_id).await?;
        let activity_ids = dedupe_ids(input.activity_ids);
        activities_of_client(&self.ctx, &client.id, &activity_ids).await?;
        let goal_ids: Vec<_> = input.goals_progress.iter().map(|e| e.goal_id.clone()).collect();
        goals_of_client(&self.ctx, &client.id, &goal_ids, "goals_progress").await?;

        let now = self.ctx.now();
        let note = ShiftNote {
            id: new_record_id(),
            client_id: client.id,
            stakeholder_id: stakeholder.id,
            shift_date: input.shift_date,
            start_time: input.start_time,
            end_time: input.end_time,
            duration_minutes,
            general_observations: input.general_observations.trim().to_string(),
            activity_ids,
            goals_progress: input.goals_progress,
            challenges: clean_text(input.challenges),
            next_steps: clean_text(input.next_steps),
            created_at: now,
            updated_at: now,
        };
        let note = self.ctx.store.put(note).await?;

        tracing::info!(
            shift_note_id = %note.id,
            client_id = %note.client_id,
            stakeholder_id = %note.stakeholder_id,
            "Shift note created"
        );
        Ok(note)
    }

    pub async fn get_shift_note(&self, id: &str) -> Result<ShiftNoteView, CoreError> {
        let note: ShiftNote = self.ctx.fetch(id).await?;
        let (client, stakeholder) = futures::try_join!(
            self.ctx.lookup::<Client>(&note.client_id),
            self.ctx.lookup::<Stakeholder>(&note.stakeholder_id),
        )?;

        let anchor = edit_anchor(note.shift_date);
        Ok(ShiftNoteView {
            client_name: client.map(|c| c.name),
            stakeholder_name: stakeholder.map(|s| s.name),
            editable: is_within_edit_window(anchor, self.ctx.now()),
            edit_window_closes_at: edit_window_closes_at(anchor),
            note,
        })
    }

    /// List notes by shift date, newest first.
    pub async fn list_shift_notes(
        &self,
        params: ShiftNoteListParams,
    ) -> Result<Vec<ShiftNote>, CoreError> {
        if let Some(client_id) = params.client_id.as_deref() {
            require_id("client_id", client_id)?;
        }
        if let Some(stakeholder_id) = params.stakeholder_id.as_deref() {
            require_id("stakeholder_id", stakeholder_id)?;
        }

        let options = page_options("shift_date", SortOrder::Desc, params.limit, params.offset);
        let notes = self
            .ctx
            .store
            .find::<ShiftNote, _>(
                |n| {
                    params.client_id.as_ref().map_or(true, |c| &n.client_id == c)
                        && params.stakeholder_id.as_ref().map_or(true, |s| &n.stakeholder_id == s)
                        && within_range(n.shift_date, params.date_from, params.date_to)
                },
                &options,
            )
            .await?;
        Ok(notes)
    }

    /// Edit a note while its window is open.
    ///
    /// The window is checked before anything else; once it has closed the
    /// note cannot change. Changed fields go through the same rules as
    /// creation.
    pub async fn update_shift_note(
        &self,
        id: &str,
        input: UpdateShiftNote,
    ) -> Result<ShiftNote, CoreError> {
        let mut note: ShiftNote = self.ctx.fetch(id).await?;
        let now = self.ctx.now();
        ensure_editable(note.shift_date, now)?;
        input.validate()?;

        if input.start_time.is_some() || input.end_time.is_some() {
            let start = input.start_time.unwrap_or(note.start_time);
            let end = input.end_time.unwrap_or(note.end_time);
            note.duration_minutes = validate_shift_times(start, end)?;
            note.start_time = start;
            note.end_time = end;
        }
        if let Some(observations) = input.general_observations {
            validate_observations(&observations)?;
            note.general_observations = observations.trim().to_string();
        }
        if let Some(activity_ids) = input.activity_ids {
            let activity_ids = dedupe_ids(activity_ids);
            activities_of_client(&self.ctx, &note.client_id, &activity_ids).await?;
            note.activity_ids = activity_ids;
        }
        if let Some(entries) = input.goals_progress {
            validate_goal_entries(&entries)?;
            let goal_ids: Vec<_> = entries.iter().map(|e| e.goal_id.clone()).collect();
            goals_of_client(&self.ctx, &note.client_id, &goal_ids, "goals_progress").await?;
            note.goals_progress = entries;
        }
        if input.challenges.is_some() {
            note.challenges = clean_text(input.challenges);
        }
        if input.next_steps.is_some() {
            note.next_steps = clean_text(input.next_steps);
        }
        note.updated_at = touch(note.updated_at, now);

        let note = self.ctx.store.put(note).await?;
        tracing::info!(shift_note_id = %note.id, client_id = %note.client_id, "Shift note updated");
        Ok(note)
    }

    /// Latest notes, optionally for one client. Defaults to ten.
    pub async fn get_recent_shift_notes(
        &self,
        client_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ShiftNote>, CoreError> {
        if let Some(client_id) = client_id {
            require_id("client_id", client_id)?;
        }
        let mut notes = match client_id {
            Some(client_id) => {
                self.ctx
                    .store
                    .find::<ShiftNote, _>(|n| n.client_id == client_id, &ListOptions::default())
                    .await?
            }
            None => self.ctx.store.all::<ShiftNote>().await?,
        };
        notes.sort_by(newest_first);
        notes.truncate(limit.unwrap_or(DEFAULT_RECENT_LIMIT).max(1));
        Ok(notes)
    }
}

/// Ratings in range and each goal reported at most once.
fn validate_goal_entries(entries: &[GoalProgressEntry]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        validate_progress_rating(entry.progress_observed)?;
        if !seen.insert(entry.goal_id.as_str()) {
            return Err(CoreError::invalid_field(
                "goals_progress",
                format!("Goal {} is reported more than once", entry.goal_id),
            ));
        }
    }
    Ok(())
}
