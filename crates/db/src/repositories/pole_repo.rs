//! Repository for the `poles` table.

use harmony_core::types::DbId;
use sqlx::PgPool;

use crate::models::pole::{CreatePole, Pole, UpdatePole};

const COLUMNS: &str = "id, name, description, lead_id, created_at, updated_at";

/// Provides CRUD operations for poles.
pub struct PoleRepo;

impl PoleRepo {
    pub async fn create(pool: &PgPool, input: &CreatePole) -> Result<Pole, sqlx::Error> {
        let query = format!(
            "INSERT INTO poles (name, description, lead_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pole>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.lead_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Pole>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM poles WHERE id = $1");
        sqlx::query_as::<_, Pole>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Pole>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM poles ORDER BY name");
        sqlx::query_as::<_, Pole>(&query).fetch_all(pool).await
    }

    /// Update a pole. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePole,
    ) -> Result<Option<Pole>, sqlx::Error> {
        let query = format!(
            "UPDATE poles SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                lead_id = COALESCE($4, lead_id) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pole>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.lead_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM poles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
