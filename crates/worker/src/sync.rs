//! Single-entity sync jobs.
//!
//! Each job reads the local row, writes its ERP counterpart through the
//! [`SyncGateway`], and stores the returned remote id. An entity that already
//! has a remote id is updated in place (users, projects) or left alone
//! (tasks, which are create-only).

use std::sync::Arc;

use harmony_core::types::DbId;
use harmony_db::models::project::Project;
use harmony_db::models::task::Task;
use harmony_db::models::user::UserWithProfile;
use harmony_db::repositories::{ProjectRepo, TaskRepo, UserRepo};
use harmony_db::DbPool;
use harmony_erp::records::{PartnerValues, ProjectValues, TaskValues};
use harmony_erp::SyncGateway;

use crate::error::SyncError;

/// What a sync job did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(DbId),
    Updated(DbId),
    /// Already mirrored, nothing written.
    Unchanged(DbId),
    /// The ERP is not configured.
    Skipped,
}

impl SyncOutcome {
    pub fn erp_id(self) -> Option<DbId> {
        match self {
            SyncOutcome::Created(id) | SyncOutcome::Updated(id) | SyncOutcome::Unchanged(id) => {
                Some(id)
            }
            SyncOutcome::Skipped => None,
        }
    }
}

/// Turn a `NotConfigured` failure into [`SyncOutcome::Skipped`].
fn skip_unconfigured(
    job: &'static str,
    id: DbId,
    result: Result<SyncOutcome, SyncError>,
) -> Result<SyncOutcome, SyncError> {
    match result {
        Err(e) if e.is_not_configured() => {
            tracing::warn!(job, id, error = %e, "ERP not configured, sync skipped");
            Ok(SyncOutcome::Skipped)
        }
        other => other,
    }
}

/// Runs sync jobs against one shared gateway.
#[derive(Clone)]
pub struct Syncer {
    pool: DbPool,
    gateway: Arc<SyncGateway>,
}

impl Syncer {
    pub fn new(pool: DbPool, gateway: Arc<SyncGateway>) -> Self {
        Self { pool, gateway }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn gateway(&self) -> &SyncGateway {
        &self.gateway
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub async fn sync_user(&self, user_id: DbId) -> Result<SyncOutcome, SyncError> {
        let result = self.load_and_push_user(user_id).await;
        skip_unconfigured("sync_user", user_id, result)
    }

    async fn load_and_push_user(&self, user_id: DbId) -> Result<SyncOutcome, SyncError> {
        let user = UserRepo::find_with_profile(&self.pool, user_id)
            .await?
            .ok_or_else(|| SyncError::not_found("user", user_id))?;
        self.push_user(&user).await
    }

    pub(crate) async fn push_user(&self, user: &UserWithProfile) -> Result<SyncOutcome, SyncError> {
        let values = partner_values(user);
        match user.erp_partner_id {
            Some(partner_id) => {
                self.gateway.update_partner(partner_id, &values).await?;
                Ok(SyncOutcome::Updated(partner_id))
            }
            None => {
                let partner_id = self.gateway.create_partner(&values).await?;
                UserRepo::set_erp_partner_id(&self.pool, user.id, partner_id).await?;
                tracing::info!(user_id = user.id, partner_id, "User synced to ERP");
                Ok(SyncOutcome::Created(partner_id))
            }
        }
    }

    /// Remove the partner of a deleted user.
    pub async fn delete_partner(&self, user_id: DbId, partner_id: DbId) -> Result<SyncOutcome, SyncError> {
        let result = self
            .gateway
            .delete_partner(partner_id)
            .await
            .map(|()| SyncOutcome::Updated(partner_id))
            .map_err(SyncError::from);
        skip_unconfigured("delete_partner", user_id, result)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn sync_project(&self, project_id: DbId) -> Result<SyncOutcome, SyncError> {
        let result = self.load_and_push_project(project_id).await;
        skip_unconfigured("sync_project", project_id, result)
    }

    async fn load_and_push_project(&self, project_id: DbId) -> Result<SyncOutcome, SyncError> {
        let project = ProjectRepo::find_by_id(&self.pool, project_id)
            .await?
            .ok_or_else(|| SyncError::not_found("project", project_id))?;
        self.push_project(&project).await
    }

    pub(crate) async fn push_project(&self, project: &Project) -> Result<SyncOutcome, SyncError> {
        let client_partner = self.client_partner(project.client_id).await?;
        let values = project_values(project, client_partner);

        match project.erp_project_id {
            Some(erp_project_id) => {
                self.gateway.update_project(erp_project_id, &values).await?;
                Ok(SyncOutcome::Updated(erp_project_id))
            }
            None => {
                let erp_project_id = self.gateway.create_project(&values).await?;
                ProjectRepo::set_erp_project_id(&self.pool, project.id, erp_project_id).await?;
                tracing::info!(project_id = project.id, erp_project_id, "Project synced to ERP");
                Ok(SyncOutcome::Created(erp_project_id))
            }
        }
    }

    /// Partner of the project's client, syncing the client first if needed.
    async fn client_partner(&self, client_id: Option<DbId>) -> Result<Option<DbId>, SyncError> {
        let Some(client_id) = client_id else {
            return Ok(None);
        };
        let Some(client) = UserRepo::find_with_profile(&self.pool, client_id).await? else {
            return Ok(None);
        };
        match client.erp_partner_id {
            Some(partner_id) => Ok(Some(partner_id)),
            None => Ok(self.push_user(&client).await?.erp_id()),
        }
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub async fn sync_task(&self, task_id: DbId) -> Result<SyncOutcome, SyncError> {
        let result = self.load_and_push_task(task_id).await;
        skip_unconfigured("sync_task", task_id, result)
    }

    async fn load_and_push_task(&self, task_id: DbId) -> Result<SyncOutcome, SyncError> {
        let task = TaskRepo::find_by_id(&self.pool, task_id)
            .await?
            .ok_or_else(|| SyncError::not_found("task", task_id))?;
        self.push_task(&task).await
    }

    async fn push_task(&self, task: &Task) -> Result<SyncOutcome, SyncError> {
        if let Some(erp_task_id) = task.erp_task_id {
            return Ok(SyncOutcome::Unchanged(erp_task_id));
        }

        let project = ProjectRepo::find_by_id(&self.pool, task.project_id)
            .await?
            .ok_or_else(|| SyncError::not_found("project", task.project_id))?;
        let erp_project_id = match project.erp_project_id {
            Some(id) => id,
            None => match self.push_project(&project).await?.erp_id() {
                Some(id) => id,
                None => return Ok(SyncOutcome::Skipped),
            },
        };

        let erp_task_id = self
            .gateway
            .create_task(&task_values(task, erp_project_id))
            .await?;
        TaskRepo::set_erp_task_id(&self.pool, task.id, erp_task_id).await?;
        tracing::info!(task_id = task.id, erp_task_id, "Task synced to ERP");
        Ok(SyncOutcome::Created(erp_task_id))
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

pub fn partner_values(user: &UserWithProfile) -> PartnerValues {
    PartnerValues {
        name: PartnerValues::display_name(&user.first_name, &user.last_name, &user.username),
        email: user.email.clone().unwrap_or_default(),
        phone: user.phone.clone().filter(|p| !p.is_empty()),
        comment: Some(PartnerValues::back_reference(user.id, &user.username)),
    }
}

pub fn project_values(project: &Project, client_partner: Option<DbId>) -> ProjectValues {
    ProjectValues {
        name: project.title.clone(),
        description: project.description.clone(),
        partner_id: client_partner,
        date_start: project.start_date,
        date: project.planned_end_date,
    }
}

pub fn task_values(task: &Task, erp_project_id: DbId) -> TaskValues {
    TaskValues::new(
        task.title.clone(),
        task.description.clone(),
        erp_project_id,
        task.priority().unwrap_or_default(),
        task.deadline,
    )
}
