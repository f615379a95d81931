//! Route definitions for the `/poles` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::pole;
use crate::state::AppState;

/// Routes mounted at `/poles`.
///
/// ```text
/// GET    /          -> list_poles
/// POST   /          -> create_pole (admin-tier)
/// GET    /{id}      -> get_pole
/// PATCH  /{id}      -> update_pole (admin-tier)
/// DELETE /{id}      -> delete_pole (admin-tier)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pole::list_poles).post(pole::create_pole))
        .route(
            "/{id}",
            get(pole::get_pole)
                .patch(pole::update_pole)
                .delete(pole::delete_pole),
        )
}
