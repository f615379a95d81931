use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether the ERP connection is established. ERP sync is optional, so
    /// this never degrades the overall status.
    pub erp_available: bool,
}

/// GET /health -- returns service, database, and ERP health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = harmony_db::health_check(&state.pool).await.is_ok();
    let erp_available = state.gateway.is_available().await;

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        erp_available,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
