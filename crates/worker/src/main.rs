use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harmony_erp::{ErpConfig, SyncGateway};
use harmony_events::{DeadlineScheduler, NotificationEngine};
use harmony_worker::{PendingSyncScheduler, Syncer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harmony_worker=debug,harmony_erp=debug,harmony_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = harmony_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    harmony_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    // --- ERP gateway ---
    let erp_config = ErpConfig::from_env();
    tracing::info!(enabled = erp_config.enabled, "Loaded ERP configuration");
    let gateway = Arc::new(SyncGateway::from_config(erp_config));

    // --- Schedulers ---
    let cancel = CancellationToken::new();

    let sync_scheduler = PendingSyncScheduler::new(Syncer::new(pool.clone(), gateway))
        .with_interval(PendingSyncScheduler::interval_from_env());
    let sync_cancel = cancel.clone();
    let sync_handle = tokio::spawn(async move { sync_scheduler.run(sync_cancel).await });

    let deadline_scheduler = DeadlineScheduler::new(NotificationEngine::new(pool))
        .with_interval(DeadlineScheduler::interval_from_env());
    let deadline_cancel = cancel.clone();
    let deadline_handle = tokio::spawn(async move { deadline_scheduler.run(deadline_cancel).await });

    tracing::info!("Worker started (pending sync, deadline sweep)");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Received SIGINT (Ctrl-C), stopping worker");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sync_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), deadline_handle).await;
    tracing::info!("Worker stopped");
}
