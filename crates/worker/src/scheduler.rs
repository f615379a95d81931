//! Periodic pending-sync reconciliation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::batch::batch_sync_pending;
use crate::sync::Syncer;

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Background service running [`batch_sync_pending`] on a fixed interval.
pub struct PendingSyncScheduler {
    syncer: Syncer,
    interval: Duration,
}

impl PendingSyncScheduler {
    pub fn new(syncer: Syncer) -> Self {
        Self {
            syncer,
            interval: DEFAULT_SYNC_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Period from `SYNC_INTERVAL_SECS`, falling back to 30 seconds.
    pub fn interval_from_env() -> Duration {
        std::env::var("SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SYNC_INTERVAL)
    }

    /// Run until `cancel` is cancelled. A run that overruns the period
    /// delays the next tick instead of stacking up.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "Pending sync scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Pending sync scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match batch_sync_pending(&self.syncer).await {
                        Ok(report) if report.synced() > 0 || report.failed > 0 => {
                            tracing::info!(
                                users = report.users,
                                projects = report.projects,
                                tasks = report.tasks,
                                failed = report.failed,
                                "Pending sync finished"
                            );
                        }
                        Ok(_) => tracing::debug!("Nothing pending for ERP sync"),
                        Err(e) => tracing::error!(error = %e, "Pending sync failed"),
                    }
                }
            }
        }
    }
}
