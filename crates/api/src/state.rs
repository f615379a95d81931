use std::sync::Arc;

use harmony_erp::SyncGateway;
use harmony_events::{EventBus, NotificationEngine};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: harmony_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Mutations publish here; notification and sync listeners subscribe.
    pub event_bus: Arc<EventBus>,
    /// Used directly by the ERP webhooks.
    pub engine: NotificationEngine,
    /// Used by the terse deadline webhook to resolve recipients.
    pub gateway: Arc<SyncGateway>,
}
