//! Repository for the `notifications` table.

use harmony_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::notification::{NewNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, kind, title, message, task_id, project_id, is_read, \
     read_at, created_at, created_on";

/// Provides idempotent creation and per-recipient access to notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Whether an equivalent notification already exists.
    ///
    /// Deadline kinds are scoped to `new.created_on`; every other kind
    /// matches on (recipient, task or project, kind) regardless of day.
    pub async fn exists(pool: &PgPool, new: &NewNotification) -> Result<bool, sqlx::Error> {
        let day: Option<Date> = new.kind.is_deadline().then_some(new.created_on);
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM notifications \
                WHERE user_id = $1 AND kind = $2 \
                  AND task_id IS NOT DISTINCT FROM $3 \
                  AND ($3::BIGINT IS NOT NULL OR project_id IS NOT DISTINCT FROM $4) \
                  AND ($5::DATE IS NULL OR created_on = $5) \
             )",
        )
        .bind(new.user_id)
        .bind(new.kind.as_str())
        .bind(new.task_id)
        .bind(new.project_id)
        .bind(day)
        .fetch_one(pool)
        .await
    }

    /// Insert unless an equivalent notification exists. Returns `true` if a
    /// row was created.
    ///
    /// The existence check only saves a write; the partial unique indexes
    /// (`uq_notifications_*`) are what guarantee one row under concurrent
    /// inserts.
    pub async fn insert_if_absent(
        pool: &PgPool,
        new: &NewNotification,
    ) -> Result<bool, sqlx::Error> {
        if Self::exists(pool, new).await? {
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, title, message, task_id, project_id, created_on) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT DO NOTHING",
        )
        .bind(new.user_id)
        .bind(new.kind.as_str())
        .bind(&new.content.title)
        .bind(&new.content.message)
        .bind(new.task_id)
        .bind(new.project_id)
        .bind(new.created_on)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List notifications for a user, newest first.
    ///
    /// `is_read` filters on read state when given.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        is_read: Option<bool>,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR is_read = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(is_read)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Find a notification owned by `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a single notification as read. Already-read notifications are
    /// returned unchanged; `None` means not found for this user.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    pub async fn delete_for_user(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every read notification of a user. Returns the count removed.
    pub async fn delete_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND is_read = true")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
