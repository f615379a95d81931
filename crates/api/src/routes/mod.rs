pub mod document;
pub mod health;
pub mod notification;
pub mod pole;
pub mod project;
pub mod task;
pub mod user;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                 list, create
/// /projects/{id}                            get, update, delete
/// /projects/{id}/status                     status transition (PATCH)
/// /projects/{id}/available-statuses         statuses offered to the caller
/// /projects/{id}/next-status                suggested workflow step
/// /projects/{id}/accept-lead                lead accepts designation (POST)
/// /projects/{id}/decline-lead               lead declines designation (POST)
///
/// /tasks                                    list (filters), create
/// /tasks/{id}                               get, update, delete
///
/// /notifications                            list (?is_read=&limit=)
/// /notifications/read-all                   mark all read (POST)
/// /notifications/unread-count               unread count
/// /notifications/read                       delete read (DELETE)
/// /notifications/{id}                       get, delete
/// /notifications/{id}/read                  mark read (POST)
///
/// /poles                                    list, create (admin-tier)
/// /poles/{id}                               get, update, delete
///
/// /documents                                list (?project_id=), create
/// /documents/{id}                           get, delete
///
/// /users                                    directory, create (admin-tier)
/// /users/me                                 caller's user and profile
/// /users/{id}                               get, delete
/// /users/{id}/profile                       role / pole assignment (PATCH)
/// ```
///
/// The ERP webhooks are mounted at root level under `/webhooks/erp` by
/// [`webhook_routes`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/tasks", task::router())
        .nest("/notifications", notification::router())
        .nest("/poles", pole::router())
        .nest("/documents", document::router())
        .nest("/users", user::router())
}

/// Routes called by the ERP rather than by users.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().nest("/webhooks/erp", webhook::router())
}
