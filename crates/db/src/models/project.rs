//! Project model and DTOs.

use harmony_core::access::ProjectAccess;
use harmony_core::error::CoreError;
use harmony_core::project::{LeadStatus, ProjectStatus, ProjectType};
use harmony_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `projects` table, with its member ids aggregated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub project_type: String,
    pub status: String,
    pub pole_id: Option<DbId>,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub lead_status: Option<String>,
    pub created_by: Option<DbId>,
    pub erp_project_id: Option<DbId>,
    pub start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    pub member_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn status(&self) -> Result<ProjectStatus, CoreError> {
        self.status.parse()
    }

    pub fn project_type(&self) -> Result<ProjectType, CoreError> {
        self.project_type.parse()
    }

    pub fn lead_status(&self) -> Result<Option<LeadStatus>, CoreError> {
        self.lead_status.as_deref().map(str::parse).transpose()
    }

    /// The fields the access policy decides on.
    pub fn access(&self) -> Result<ProjectAccess, CoreError> {
        Ok(ProjectAccess {
            id: self.id,
            created_by: self.created_by,
            status: self.status()?,
            pole_id: self.pole_id,
            client_id: self.client_id,
            lead_id: self.lead_id,
            lead_status: self.lead_status()?,
            member_ids: self.member_ids.clone(),
        })
    }
}

/// DTO for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub project_type: Option<ProjectType>,
    /// Defaults to draft. Admin-tier creators are promoted past the
    /// approval gate.
    pub status: Option<ProjectStatus>,
    pub pole_id: Option<DbId>,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    #[serde(default)]
    pub member_ids: Vec<DbId>,
}

/// DTO for updating a project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<ProjectType>,
    pub status: Option<ProjectStatus>,
    pub pole_id: Option<DbId>,
    pub client_id: Option<DbId>,
    /// `null` removes the lead; a missing key keeps the current one.
    #[serde(default, deserialize_with = "crate::models::nullable")]
    pub lead_id: Option<Option<DbId>>,
    pub start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    /// Members to add. Existing members are never removed by an update.
    pub member_ids: Option<Vec<DbId>>,
}

impl UpdateProject {
    /// The lead once this update is applied to a project led by `current`.
    pub fn lead_after(&self, current: Option<DbId>) -> Option<DbId> {
        self.lead_id.unwrap_or(current)
    }

    /// Whether the update touches anything besides `member_ids`.
    pub fn touches_details(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.project_type.is_some()
            || self.status.is_some()
            || self.pole_id.is_some()
            || self.client_id.is_some()
            || self.lead_id.is_some()
            || self.start_date.is_some()
            || self.planned_end_date.is_some()
            || self.actual_end_date.is_some()
    }
}

/// DTO for the dedicated status transition.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectStatus {
    pub status: ProjectStatus,
}
