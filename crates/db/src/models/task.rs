//! Task model and DTOs.

use harmony_core::error::CoreError;
use harmony_core::task::{Priority, TaskStatus};
use harmony_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table, with its assignee ids aggregated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub deadline: Option<Date>,
    pub erp_task_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub assignee_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn status(&self) -> Result<TaskStatus, CoreError> {
        self.status.parse()
    }

    pub fn priority(&self) -> Result<Priority, CoreError> {
        self.priority.parse()
    }
}

/// DTO for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub project_id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub deadline: Option<Date>,
    #[serde(default)]
    pub assignee_ids: Vec<DbId>,
}

/// DTO for updating a task. All fields are optional; `assignee_ids`, when
/// present, replaces the whole assignee set. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub deadline: Option<Date>,
    pub assignee_ids: Option<Vec<DbId>>,
}

/// Query filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<DbId>,
    pub assignee_id: Option<DbId>,
    pub status: Option<TaskStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rejects_unknown_keys() {
        assert!(serde_json::from_str::<UpdateTask>(r#"{"status":"done","titre":"x"}"#).is_err());
        assert!(serde_json::from_str::<UpdateTask>(r#"{"project_id":9}"#).is_err());

        let update: UpdateTask = serde_json::from_str(r#"{"status":"done","title":null}"#).unwrap();
        assert_eq!(update.status, Some(TaskStatus::Done));
        assert_eq!(update.title, None);
    }
}
