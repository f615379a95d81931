//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                 -> list_notifications (?is_read=&limit=)
/// POST   /read-all         -> mark_all_read
/// GET    /unread-count     -> unread_count
/// DELETE /read             -> delete_read
/// GET    /{id}             -> get_notification
/// DELETE /{id}             -> delete_notification
/// POST   /{id}/read        -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list_notifications))
        .route("/read-all", post(notification::mark_all_read))
        .route("/unread-count", get(notification::unread_count))
        .route("/read", delete(notification::delete_read))
        .route(
            "/{id}",
            get(notification::get_notification).delete(notification::delete_notification),
        )
        .route("/{id}/read", post(notification::mark_read))
}
