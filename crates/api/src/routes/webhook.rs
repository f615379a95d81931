//! Route definitions for inbound ERP webhooks.
//!
//! Authenticated by the shared `ERP_WEBHOOK_SECRET` bearer token, not by
//! user JWTs.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// Routes mounted at `/webhooks/erp`.
///
/// ```text
/// POST   /deadline         -> erp_deadline (?type= for terse payloads)
/// POST   /task-assigned    -> erp_task_assigned
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deadline", post(webhook::erp_deadline))
        .route("/task-assigned", post(webhook::erp_task_assigned))
}
