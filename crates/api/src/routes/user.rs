//! Route definitions for the `/users` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /                -> list_directory
/// POST   /                -> create_user (admin-tier)
/// GET    /me              -> me
/// GET    /{id}            -> get_user
/// DELETE /{id}            -> delete_user (admin-tier)
/// PATCH  /{id}/profile    -> update_profile (admin-tier)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user::list_directory).post(user::create_user))
        .route("/me", get(user::me))
        .route("/{id}", get(user::get_user).delete(user::delete_user))
        .route("/{id}/profile", patch(user::update_profile))
}
