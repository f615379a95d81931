use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harmony_api::config::ServerConfig;
use harmony_api::router::build_app_router;
use harmony_api::state::AppState;
use harmony_erp::{ErpConfig, SyncGateway};
use harmony_events::{DeadlineScheduler, EventBus, NotificationEngine, NotificationListener};
use harmony_worker::{PendingSyncScheduler, SyncListener, Syncer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "harmony_api=debug,harmony_events=debug,harmony_worker=debug,harmony_erp=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = harmony_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    harmony_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    harmony_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- ERP gateway ---
    // Connects lazily on first use; an unconfigured ERP only disables sync.
    let erp_config = ErpConfig::from_env();
    tracing::info!(enabled = erp_config.enabled, "Loaded ERP configuration");
    let gateway = Arc::new(SyncGateway::from_config(erp_config));
    let syncer = Syncer::new(pool.clone(), Arc::clone(&gateway));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let engine = NotificationEngine::new(pool.clone());

    let notification_handle = tokio::spawn(NotificationListener::run(
        engine.clone(),
        event_bus.subscribe(),
    ));
    let sync_handle = tokio::spawn(SyncListener::run(syncer.clone(), event_bus.subscribe()));

    // --- Schedulers ---
    let cancel = CancellationToken::new();

    let deadline_scheduler = DeadlineScheduler::new(engine.clone())
        .with_interval(DeadlineScheduler::interval_from_env());
    let deadline_cancel = cancel.clone();
    let deadline_handle = tokio::spawn(async move {
        deadline_scheduler.run(deadline_cancel).await;
    });

    let sync_scheduler =
        PendingSyncScheduler::new(syncer).with_interval(PendingSyncScheduler::interval_from_env());
    let sync_cancel = cancel.clone();
    let sync_scheduler_handle = tokio::spawn(async move {
        sync_scheduler.run(sync_cancel).await;
    });

    tracing::info!("Background services started (notification listener, sync listener, schedulers)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        engine,
        gateway,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), deadline_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sync_scheduler_handle).await;
    tracing::info!("Schedulers stopped");

    // Dropping the last sender closes the channel and ends both listeners.
    // The router (and its state clone) is gone once `serve` returns.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), notification_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sync_handle).await;
    tracing::info!("Event listeners shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
