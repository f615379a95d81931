//! Repository for the `tasks` and `task_assignees` tables.

use harmony_core::notification::DeadlineWindow;
use harmony_core::task::{Priority, TaskStatus};
use harmony_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use crate::repositories::project_repo::insert_members;

/// Column list for `tasks t` queries, assignees aggregated in id order.
const COLUMNS: &str = "t.id, t.project_id, t.title, t.description, t.status, t.priority, \
     t.deadline, t.erp_task_id, t.created_by, \
     ARRAY(SELECT a.user_id FROM task_assignees a WHERE a.task_id = t.id ORDER BY a.user_id) \
        AS assignee_ids, \
     t.created_at, t.updated_at";

/// Provides CRUD operations for tasks and their assignees.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task with its initial assignees. Assignees who are not yet
    /// members of the project become members in the same transaction.
    ///
    /// Returns the task and the assignee ids (all of them are new).
    pub async fn create(
        pool: &PgPool,
        input: &CreateTask,
        created_by: DbId,
    ) -> Result<(Task, Vec<DbId>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO tasks (project_id, title, description, status, priority, deadline, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(input.project_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.unwrap_or(TaskStatus::Todo).as_str())
        .bind(input.priority.unwrap_or_default().as_str())
        .bind(input.deadline)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let added = insert_assignees(&mut tx, id, input.project_id, &input.assignee_ids).await?;
        tx.commit().await?;

        let task = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok((task, added))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t WHERE t.id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_erp_id(pool: &PgPool, erp_task_id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks t WHERE t.erp_task_id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(erp_task_id)
            .fetch_optional(pool)
            .await
    }

    /// Tasks matching `filter`, nearest deadline first. Callers filter the
    /// result through the visibility policy.
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Task>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM tasks t WHERE TRUE"));

        if let Some(project_id) = filter.project_id {
            qb.push(" AND t.project_id = ").push_bind(project_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            qb.push(" AND EXISTS (SELECT 1 FROM task_assignees a WHERE a.task_id = t.id AND a.user_id = ")
                .push_bind(assignee_id)
                .push(")");
        }
        if let Some(status) = filter.status {
            qb.push(" AND t.status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY t.deadline ASC NULLS LAST, t.id");

        qb.build_query_as::<Task>().fetch_all(pool).await
    }

    /// Update a task in one transaction: scalar fields first, then, when
    /// `assignee_ids` is supplied, the assignee set is replaced. Newly
    /// added assignees are enrolled as project members; removed assignees
    /// keep their membership.
    ///
    /// Returns the task and the newly added assignee ids, or `None` if no
    /// row with the given `id` exists. Nothing is written on error.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        project_id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<(Task, Vec<DbId>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE tasks SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                status = COALESCE($4, status), \
                priority = COALESCE($5, priority), \
                deadline = COALESCE($6, deadline) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.map(TaskStatus::as_str))
        .bind(input.priority.map(Priority::as_str))
        .bind(input.deadline)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        let added = match &input.assignee_ids {
            Some(ids) => replace_assignees(&mut tx, id, project_id, ids).await?,
            None => Vec::new(),
        };
        tx.commit().await?;

        let task = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(Some((task, added)))
    }

    /// Replace the assignee set on its own. See [`TaskRepo::update`].
    pub async fn set_assignees(
        pool: &PgPool,
        task_id: DbId,
        project_id: DbId,
        user_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let added = replace_assignees(&mut tx, task_id, project_id, user_ids).await?;
        tx.commit().await?;
        Ok(added)
    }

    /// Add assignees without touching existing ones. Returns the newly
    /// added ids; repeating a call adds nothing.
    pub async fn add_assignees(
        pool: &PgPool,
        task_id: DbId,
        project_id: DbId,
        user_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let added = insert_assignees(&mut tx, task_id, project_id, user_ids).await?;
        tx.commit().await?;
        Ok(added)
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Open tasks whose deadline falls in `window`.
    pub async fn open_in_window(
        pool: &PgPool,
        window: DeadlineWindow,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let open: Vec<&str> = TaskStatus::OPEN.iter().map(|s| s.as_str()).collect();
        let (op, date) = match window {
            DeadlineWindow::On(date) => ("=", date),
            DeadlineWindow::Before(date) => ("<", date),
        };
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             WHERE t.deadline {op} $1 AND t.status = ANY($2) \
             ORDER BY t.id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(date)
            .bind(&open)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // ERP correlation
    // -----------------------------------------------------------------------

    pub async fn set_erp_task_id(
        pool: &PgPool,
        id: DbId,
        erp_task_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET erp_task_id = $2 WHERE id = $1")
            .bind(id)
            .bind(erp_task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Unsynced tasks whose project is already mirrored in the ERP, oldest
    /// first. Tasks of unsynced projects wait for a later sweep.
    pub async fn pending_sync(pool: &PgPool, limit: i64) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t \
             JOIN projects p ON p.id = t.project_id \
             WHERE t.erp_task_id IS NULL AND p.erp_project_id IS NOT NULL \
             ORDER BY t.id LIMIT $1"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

/// Insert assignees and the matching project memberships inside `tx`.
/// Returns the assignee ids that were not assigned before.
async fn insert_assignees(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    task_id: DbId,
    project_id: DbId,
    user_ids: &[DbId],
) -> Result<Vec<DbId>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut added: Vec<DbId> = sqlx::query_scalar(
        "INSERT INTO task_assignees (task_id, user_id) \
         SELECT DISTINCT $1::BIGINT, u FROM UNNEST($2::BIGINT[]) AS u \
         ON CONFLICT DO NOTHING \
         RETURNING user_id",
    )
    .bind(task_id)
    .bind(user_ids)
    .fetch_all(&mut **tx)
    .await?;

    insert_members(tx, project_id, user_ids).await?;

    added.sort_unstable();
    Ok(added)
}

/// Replace the assignee set inside `tx`. Returns the newly added ids.
async fn replace_assignees(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    task_id: DbId,
    project_id: DbId,
    user_ids: &[DbId],
) -> Result<Vec<DbId>, sqlx::Error> {
    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1 AND user_id <> ALL($2)")
        .bind(task_id)
        .bind(user_ids)
        .execute(&mut **tx)
        .await?;

    insert_assignees(tx, task_id, project_id, user_ids).await
}
