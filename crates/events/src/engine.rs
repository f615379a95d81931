//! Notification engine.
//!
//! Every notification is created through [`NotificationRepo::insert_if_absent`],
//! so running the same sweep or replaying the same event twice creates
//! nothing new. Individual insert failures are logged and skipped; they
//! never abort the sweep or the mutation that triggered them.

use std::collections::HashMap;

use chrono::Utc;
use harmony_core::notification::{
    deadline_recipients, DeadlineWindow, NotificationContent, NotificationKind,
};
use harmony_core::project::ProjectType;
use harmony_core::types::{Date, DbId};
use harmony_db::models::notification::NewNotification;
use harmony_db::models::project::Project;
use harmony_db::models::task::Task;
use harmony_db::repositories::{NotificationRepo, ProjectRepo, TaskRepo};
use harmony_db::DbPool;

/// Outcome of one deadline sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks that matched a deadline window.
    pub tasks: usize,
    /// Notifications actually inserted.
    pub created: usize,
}

/// Creates deadline and assignment notifications.
#[derive(Clone)]
pub struct NotificationEngine {
    pool: DbPool,
}

impl NotificationEngine {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Today's date in UTC, the calendar day deadline notifications are
    /// deduplicated on.
    pub fn today() -> Date {
        Utc::now().date_naive()
    }

    // -----------------------------------------------------------------------
    // Deadline sweep
    // -----------------------------------------------------------------------

    /// Run all four deadline windows relative to `today` and fan out to
    /// assignees and the project lead.
    pub async fn check_deadline_notifications(&self, today: Date) -> Result<SweepReport, sqlx::Error> {
        let mut report = SweepReport::default();
        let mut leads: HashMap<DbId, Option<DbId>> = HashMap::new();

        for &kind in NotificationKind::DEADLINE {
            let Some(window) = DeadlineWindow::for_kind(kind, today) else {
                continue;
            };
            let tasks = TaskRepo::open_in_window(&self.pool, window).await?;

            for task in &tasks {
                let lead_id = match leads.get(&task.project_id) {
                    Some(lead) => *lead,
                    None => {
                        let lead = ProjectRepo::find_by_id(&self.pool, task.project_id)
                            .await?
                            .and_then(|p| p.lead_id);
                        leads.insert(task.project_id, lead);
                        lead
                    }
                };
                report.tasks += 1;
                report.created += self
                    .create_deadline_notification(task, lead_id, kind, today)
                    .await;
            }
        }

        Ok(report)
    }

    /// Notify every recipient of `task` about `kind`, at most once per
    /// recipient per day. Returns how many notifications were created.
    pub async fn create_deadline_notification(
        &self,
        task: &Task,
        lead_id: Option<DbId>,
        kind: NotificationKind,
        today: Date,
    ) -> usize {
        self.insert_all(plan_deadline(task, lead_id, kind, today))
            .await
    }

    /// Deadline notification pushed by the ERP for already-resolved local
    /// recipients.
    pub async fn create_remote_deadline_notifications(
        &self,
        task: &Task,
        kind: NotificationKind,
        recipients: &[DbId],
        today: Date,
    ) -> usize {
        let Some(content) = NotificationContent::remote_deadline(kind, &task.title, task.deadline)
        else {
            return 0;
        };
        let planned = recipients
            .iter()
            .map(|&user_id| NewNotification {
                user_id,
                kind,
                content: content.clone(),
                task_id: Some(task.id),
                project_id: Some(task.project_id),
                created_on: today,
            })
            .collect();
        self.insert_all(planned).await
    }

    // -----------------------------------------------------------------------
    // Assignment notifications
    // -----------------------------------------------------------------------

    pub async fn notify_task_assigned(
        &self,
        task_id: DbId,
        user_ids: &[DbId],
    ) -> Result<usize, sqlx::Error> {
        let Some(task) = TaskRepo::find_by_id(&self.pool, task_id).await? else {
            tracing::warn!(task_id, "Task vanished before assignment notification");
            return Ok(0);
        };
        Ok(self
            .insert_all(plan_task_assigned(&task, user_ids, Self::today()))
            .await)
    }

    pub async fn notify_project_assigned(
        &self,
        project_id: DbId,
        user_ids: &[DbId],
    ) -> Result<usize, sqlx::Error> {
        let Some(project) = ProjectRepo::find_by_id(&self.pool, project_id).await? else {
            tracing::warn!(project_id, "Project vanished before assignment notification");
            return Ok(0);
        };
        Ok(self
            .insert_all(plan_project_assigned(
                &project,
                user_ids,
                NotificationKind::ProjectAssigned,
                Self::today(),
            ))
            .await)
    }

    pub async fn notify_project_lead_assigned(
        &self,
        project_id: DbId,
        lead_id: DbId,
    ) -> Result<usize, sqlx::Error> {
        let Some(project) = ProjectRepo::find_by_id(&self.pool, project_id).await? else {
            tracing::warn!(project_id, "Project vanished before lead notification");
            return Ok(0);
        };
        Ok(self
            .insert_all(plan_project_assigned(
                &project,
                &[lead_id],
                NotificationKind::ProjectLeadAssigned,
                Self::today(),
            ))
            .await)
    }

    /// Insert each planned notification, logging failures.
    async fn insert_all(&self, planned: Vec<NewNotification>) -> usize {
        let mut created = 0;
        for new in &planned {
            match NotificationRepo::insert_if_absent(&self.pool, new).await {
                Ok(true) => {
                    created += 1;
                    tracing::info!(
                        user_id = new.user_id,
                        kind = %new.kind,
                        task_id = ?new.task_id,
                        project_id = ?new.project_id,
                        "Created notification"
                    );
                }
                Ok(false) => {
                    tracing::debug!(user_id = new.user_id, kind = %new.kind, "Notification already exists");
                }
                Err(e) => {
                    tracing::error!(
                        user_id = new.user_id,
                        kind = %new.kind,
                        error = %e,
                        "Failed to create notification"
                    );
                }
            }
        }
        created
    }
}

// ---------------------------------------------------------------------------
// Planning (pure)
// ---------------------------------------------------------------------------

/// Deadline notifications for `task`: one per assignee and the lead.
/// Empty when the task has no deadline or `kind` is not a deadline kind.
pub fn plan_deadline(
    task: &Task,
    lead_id: Option<DbId>,
    kind: NotificationKind,
    today: Date,
) -> Vec<NewNotification> {
    let Some(deadline) = task.deadline else {
        return Vec::new();
    };
    let Some(content) = NotificationContent::deadline(kind, &task.title, deadline, today) else {
        return Vec::new();
    };

    deadline_recipients(&task.assignee_ids, lead_id)
        .into_iter()
        .map(|user_id| NewNotification {
            user_id,
            kind,
            content: content.clone(),
            task_id: Some(task.id),
            project_id: Some(task.project_id),
            created_on: today,
        })
        .collect()
}

pub fn plan_task_assigned(task: &Task, user_ids: &[DbId], today: Date) -> Vec<NewNotification> {
    let content = NotificationContent::task_assigned(&task.title, task.deadline);
    user_ids
        .iter()
        .map(|&user_id| NewNotification {
            user_id,
            kind: NotificationKind::TaskAssigned,
            content: content.clone(),
            task_id: Some(task.id),
            project_id: Some(task.project_id),
            created_on: today,
        })
        .collect()
}

/// Project-level assignment notifications (`project_assigned` or
/// `project_lead_assigned`).
pub fn plan_project_assigned(
    project: &Project,
    user_ids: &[DbId],
    kind: NotificationKind,
    today: Date,
) -> Vec<NewNotification> {
    let project_type = project.project_type().unwrap_or(ProjectType::Other);
    let content = match kind {
        NotificationKind::ProjectLeadAssigned => {
            NotificationContent::project_lead_assigned(&project.title, project_type)
        }
        _ => NotificationContent::project_assigned(&project.title, project_type),
    };
    user_ids
        .iter()
        .map(|&user_id| NewNotification {
            user_id,
            kind,
            content: content.clone(),
            task_id: None,
            project_id: Some(project.id),
            created_on: today,
        })
        .collect()
}
