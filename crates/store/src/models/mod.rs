//! Entity models and DTOs.
//!
//! Each submodule contains:
//! - A `Serialize` + `Deserialize` entity struct matching the stored record
//! - A `Deserialize` + `Validate` create DTO
//! - A `Deserialize` + `Validate` update DTO (all `Option` fields) for patches
//! - A `Deserialize` list-parameter struct

pub mod activity;
pub mod client;
pub mod goal;
pub mod shift_note;
pub mod stakeholder;

pub use activity::Activity;
pub use client::Client;
pub use goal::Goal;
pub use shift_note::ShiftNote;
pub use stakeholder::Stakeholder;
