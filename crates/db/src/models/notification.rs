//! Notification model.

use harmony_core::notification::{NotificationContent, NotificationKind};
use harmony_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub task_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub created_on: Date,
}

/// A notification about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: DbId,
    pub kind: NotificationKind,
    pub content: NotificationContent,
    pub task_id: Option<DbId>,
    pub project_id: Option<DbId>,
    /// Calendar day the notification belongs to.
    pub created_on: Date,
}
