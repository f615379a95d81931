//! Repository for the `users` and `profiles` tables.

use harmony_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateProfile, UserWithProfile};

/// Users left-joined with their profile.
const JOINED: &str = "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.is_active, \
     p.role, p.pole_id, p.client_type, p.phone, p.erp_partner_id \
     FROM users u LEFT JOIN profiles p ON p.user_id = u.id";

/// Provides access to users and their profiles.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user and its profile in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<UserWithProfile, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (username, email, first_name, last_name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO profiles (user_id, role, pole_id, client_type, phone) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(input.role.as_str())
        .bind(input.pole_id)
        .bind(&input.client_type)
        .bind(&input.phone)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::find_with_profile(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a user with its profile, if any. Inactive users are included.
    pub async fn find_with_profile(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserWithProfile>, sqlx::Error> {
        let query = format!("{JOINED} WHERE u.id = $1");
        sqlx::query_as::<_, UserWithProfile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active users ordered by username.
    pub async fn list_directory(pool: &PgPool) -> Result<Vec<UserWithProfile>, sqlx::Error> {
        let query = format!("{JOINED} WHERE u.is_active ORDER BY u.username");
        sqlx::query_as::<_, UserWithProfile>(&query)
            .fetch_all(pool)
            .await
    }

    /// Apply an admin profile change, creating the profile if it is
    /// missing. Returns `None` if the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<UserWithProfile>, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO profiles (user_id, role, pole_id, client_type, phone) \
             SELECT id, COALESCE($2, 'member'), $3, $4, $5 FROM users WHERE id = $1 \
             ON CONFLICT (user_id) DO UPDATE SET \
                role = COALESCE($2, profiles.role), \
                pole_id = COALESCE($3, profiles.pole_id), \
                client_type = COALESCE($4, profiles.client_type), \
                phone = COALESCE($5, profiles.phone)",
        )
        .bind(user_id)
        .bind(input.role.map(|r| r.as_str()))
        .bind(input.pole_id)
        .bind(&input.client_type)
        .bind(&input.phone)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_with_profile(pool, user_id).await
    }

    /// Permanently delete a user. Projects they lead lose their lead and
    /// its pending or given answer. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE projects SET lead_id = NULL, lead_status = NULL WHERE lead_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // ERP correlation
    // -----------------------------------------------------------------------

    pub async fn set_erp_partner_id(
        pool: &PgPool,
        user_id: DbId,
        partner_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE profiles SET erp_partner_id = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(partner_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Active users with a profile that have no ERP partner yet, oldest
    /// first.
    pub async fn pending_sync(pool: &PgPool, limit: i64) -> Result<Vec<UserWithProfile>, sqlx::Error> {
        let query = format!(
            "{JOINED} WHERE u.is_active AND p.user_id IS NOT NULL AND p.erp_partner_id IS NULL \
             ORDER BY u.id LIMIT $1"
        );
        sqlx::query_as::<_, UserWithProfile>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Map ERP partner ids back to local user ids, restricted to
    /// `candidates`. Unknown partners are silently dropped.
    pub async fn find_ids_by_partner_ids(
        pool: &PgPool,
        partner_ids: &[DbId],
        candidates: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM profiles \
             WHERE erp_partner_id = ANY($1) AND user_id = ANY($2) \
             ORDER BY user_id",
        )
        .bind(partner_ids)
        .bind(candidates)
        .fetch_all(pool)
        .await
    }

    pub async fn find_id_by_partner_id(
        pool: &PgPool,
        partner_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT user_id FROM profiles WHERE erp_partner_id = $1")
            .bind(partner_id)
            .fetch_optional(pool)
            .await
    }
}
