//! Bounded reconciliation of entities not yet mirrored in the ERP.
//!
//! Each run takes at most [`USER_BATCH`] users, [`PROJECT_BATCH`] projects
//! and [`TASK_BATCH`] tasks so a large backlog cannot monopolize the
//! throttle. Tasks whose project has no remote id are left for a later run.
//! Tasks sharing a remote project are created with a single call.

use std::collections::{BTreeMap, HashMap};

use harmony_core::types::DbId;
use harmony_db::models::task::Task;
use harmony_db::repositories::{ProjectRepo, TaskRepo, UserRepo};

use crate::error::SyncError;
use crate::sync::{task_values, Syncer};

pub const USER_BATCH: i64 = 10;
pub const PROJECT_BATCH: i64 = 10;
pub const TASK_BATCH: i64 = 20;

/// Counts from one reconciliation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub users: usize,
    pub projects: usize,
    pub tasks: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn synced(&self) -> usize {
        self.users + self.projects + self.tasks
    }
}

/// Push one page of each pending entity kind. Per-entity failures are
/// logged and counted; only database errors while listing abort the run.
pub async fn batch_sync_pending(syncer: &Syncer) -> Result<BatchReport, SyncError> {
    let mut report = BatchReport::default();

    if !syncer.gateway().is_available().await {
        tracing::debug!("ERP not available, pending sync skipped");
        return Ok(report);
    }

    let pool = syncer.pool();

    for user in UserRepo::pending_sync(pool, USER_BATCH).await? {
        match syncer.push_user(&user).await {
            Ok(_) => report.users += 1,
            Err(e) => {
                report.failed += 1;
                tracing::error!(user_id = user.id, error = %e, "Pending user sync failed");
            }
        }
    }

    for project in ProjectRepo::pending_sync(pool, PROJECT_BATCH).await? {
        match syncer.push_project(&project).await {
            Ok(_) => report.projects += 1,
            Err(e) => {
                report.failed += 1;
                tracing::error!(project_id = project.id, error = %e, "Pending project sync failed");
            }
        }
    }

    let tasks = TaskRepo::pending_sync(pool, TASK_BATCH).await?;
    let mut erp_projects: HashMap<DbId, DbId> = HashMap::new();
    for task in &tasks {
        if erp_projects.contains_key(&task.project_id) {
            continue;
        }
        if let Some(erp_id) = ProjectRepo::find_by_id(pool, task.project_id)
            .await?
            .and_then(|p| p.erp_project_id)
        {
            erp_projects.insert(task.project_id, erp_id);
        }
    }

    for (erp_project_id, group) in group_by_erp_project(&tasks, &erp_projects) {
        let values: Vec<_> = group.iter().map(|t| task_values(t, erp_project_id)).collect();
        match syncer.gateway().batch_create_tasks(&values).await {
            Ok(erp_ids) => {
                for (task, erp_task_id) in group.iter().zip(erp_ids) {
                    match TaskRepo::set_erp_task_id(pool, task.id, erp_task_id).await {
                        Ok(()) => report.tasks += 1,
                        Err(e) => {
                            report.failed += 1;
                            tracing::error!(
                                task_id = task.id,
                                erp_task_id,
                                error = %e,
                                "Failed to store ERP task id"
                            );
                        }
                    }
                }
            }
            Err(e) => {
                report.failed += group.len();
                tracing::error!(
                    erp_project_id,
                    count = group.len(),
                    error = %e,
                    "Batch task sync failed"
                );
            }
        }
    }

    Ok(report)
}

/// Tasks grouped by the remote id of their project, in ascending remote id
/// order. Tasks whose project has no remote id are dropped.
pub fn group_by_erp_project<'a>(
    tasks: &'a [Task],
    erp_projects: &HashMap<DbId, DbId>,
) -> BTreeMap<DbId, Vec<&'a Task>> {
    let mut groups: BTreeMap<DbId, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(&erp_project_id) = erp_projects.get(&task.project_id) {
            groups.entry(erp_project_id).or_default().push(task);
        }
    }
    groups
}
