//! Route definitions for the `/projects` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                            -> list_projects
/// POST   /                            -> create_project
/// GET    /{id}                        -> get_project
/// PATCH  /{id}                        -> update_project
/// DELETE /{id}                        -> delete_project (super-admin)
/// PATCH  /{id}/status                 -> change_status
/// GET    /{id}/available-statuses     -> available_statuses
/// GET    /{id}/next-status            -> next_status
/// POST   /{id}/accept-lead            -> accept_lead
/// POST   /{id}/decline-lead           -> decline_lead
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_projects).post(project::create_project))
        .route(
            "/{id}",
            get(project::get_project)
                .patch(project::update_project)
                .delete(project::delete_project),
        )
        .route("/{id}/status", patch(project::change_status))
        .route("/{id}/available-statuses", get(project::available_statuses))
        .route("/{id}/next-status", get(project::next_status))
        .route("/{id}/accept-lead", post(project::accept_lead))
        .route("/{id}/decline-lead", post(project::decline_lead))
}
