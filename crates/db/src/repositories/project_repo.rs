//! Repository for the `projects` and `project_members` tables.

use harmony_core::project::{LeadStatus, ProjectStatus, ProjectType};
use harmony_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list for `projects p` queries, members aggregated in id order.
const COLUMNS: &str = "p.id, p.title, p.description, p.project_type, p.status, p.pole_id, \
     p.client_id, p.lead_id, p.lead_status, p.created_by, p.erp_project_id, p.start_date, \
     p.planned_end_date, p.actual_end_date, \
     ARRAY(SELECT m.user_id FROM project_members m WHERE m.project_id = p.id ORDER BY m.user_id) \
        AS member_ids, \
     p.created_at, p.updated_at";

/// Provides CRUD operations for projects and their membership.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project and its initial members.
    ///
    /// `status` and `lead_status` are decided by the caller; the requested
    /// status in `input` is ignored here.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProject,
        created_by: DbId,
        status: ProjectStatus,
        lead_status: Option<LeadStatus>,
    ) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO projects \
                (title, description, project_type, status, pole_id, client_id, lead_id, \
                 lead_status, created_by, start_date, planned_end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.project_type.unwrap_or(ProjectType::Other).as_str())
        .bind(status.as_str())
        .bind(input.pole_id)
        .bind(input.client_id)
        .bind(input.lead_id)
        .bind(lead_status.map(LeadStatus::as_str))
        .bind(created_by)
        .bind(input.start_date)
        .bind(input.planned_end_date)
        .fetch_one(&mut *tx)
        .await?;

        insert_members(&mut tx, id, &input.member_ids).await?;
        tx.commit().await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects p WHERE p.id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All projects, most recent first. Callers filter through the
    /// visibility policy.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects p ORDER BY p.created_at DESC, p.id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Update a project and add members in one transaction. Only
    /// non-`None` fields in `input` are applied; `lead_id` may be cleared
    /// with an explicit `null`, and `lead_status` is always written.
    ///
    /// Returns the project and the newly added member ids, or `None` if no
    /// row with the given `id` exists. Nothing is written on error.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
        lead_status: Option<LeadStatus>,
    ) -> Result<Option<(Project, Vec<DbId>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE projects SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                project_type = COALESCE($4, project_type), \
                status = COALESCE($5, status), \
                pole_id = COALESCE($6, pole_id), \
                client_id = COALESCE($7, client_id), \
                lead_id = CASE WHEN $8 THEN $9 ELSE lead_id END, \
                lead_status = $10, \
                start_date = COALESCE($11, start_date), \
                planned_end_date = COALESCE($12, planned_end_date), \
                actual_end_date = COALESCE($13, actual_end_date) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.project_type.map(ProjectType::as_str))
        .bind(input.status.map(ProjectStatus::as_str))
        .bind(input.pole_id)
        .bind(input.client_id)
        .bind(input.lead_id.is_some())
        .bind(input.lead_id.flatten())
        .bind(lead_status.map(LeadStatus::as_str))
        .bind(input.start_date)
        .bind(input.planned_end_date)
        .bind(input.actual_end_date)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        let added = match &input.member_ids {
            Some(ids) => insert_members(&mut tx, id, ids).await?,
            None => Vec::new(),
        };
        tx.commit().await?;

        let project = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(Some((project, added)))
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, sqlx::Error> {
        let updated = sqlx::query("UPDATE projects SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Record the lead's answer, only while the designation is still
    /// pending for `lead_id`. Returns `false` when another answer won.
    pub async fn resolve_lead(
        pool: &PgPool,
        id: DbId,
        lead_id: DbId,
        answer: LeadStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET lead_status = $3 \
             WHERE id = $1 AND lead_id = $2 AND lead_status = 'pending'",
        )
        .bind(id)
        .bind(lead_id)
        .bind(answer.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a project; tasks and documents cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // ERP correlation
    // -----------------------------------------------------------------------

    pub async fn set_erp_project_id(
        pool: &PgPool,
        id: DbId,
        erp_project_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET erp_project_id = $2 WHERE id = $1")
            .bind(id)
            .bind(erp_project_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Projects not yet mirrored in the ERP, oldest first.
    pub async fn pending_sync(pool: &PgPool, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p WHERE p.erp_project_id IS NULL \
             ORDER BY p.id LIMIT $1"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

/// Insert memberships inside `tx`, returning only the newly created ones.
pub(crate) async fn insert_members(
    tx: &mut Transaction<'_, Postgres>,
    project_id: DbId,
    user_ids: &[DbId],
) -> Result<Vec<DbId>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_scalar(
        "INSERT INTO project_members (project_id, user_id) \
         SELECT DISTINCT $1::BIGINT, u FROM UNNEST($2::BIGINT[]) AS u \
         ON CONFLICT DO NOTHING \
         RETURNING user_id",
    )
    .bind(project_id)
    .bind(user_ids)
    .fetch_all(&mut **tx)
    .await
}
