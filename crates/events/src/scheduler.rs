//! Periodic deadline sweep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::NotificationEngine;

/// Default sweep period.
pub const DEFAULT_DEADLINE_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Background service running [`NotificationEngine::check_deadline_notifications`]
/// on a fixed interval.
pub struct DeadlineScheduler {
    engine: NotificationEngine,
    interval: Duration,
}

impl DeadlineScheduler {
    pub fn new(engine: NotificationEngine) -> Self {
        Self {
            engine,
            interval: DEFAULT_DEADLINE_CHECK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Period from `DEADLINE_CHECK_INTERVAL_SECS`, falling back to the
    /// hourly default when unset or unparsable.
    pub fn interval_from_env() -> Duration {
        std::env::var("DEADLINE_CHECK_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_DEADLINE_CHECK_INTERVAL)
    }

    /// Run the sweep loop. The first sweep happens immediately; the loop
    /// exits when `cancel` is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::info!(interval_secs = self.interval.as_secs(), "Deadline scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Deadline scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let today = NotificationEngine::today();
                    match self.engine.check_deadline_notifications(today).await {
                        Ok(report) if report.created > 0 => {
                            tracing::info!(
                                tasks = report.tasks,
                                created = report.created,
                                "Deadline notifications created"
                            );
                        }
                        Ok(report) => {
                            tracing::debug!(tasks = report.tasks, "Deadline sweep found nothing new");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Deadline sweep failed");
                        }
                    }
                }
            }
        }
    }
}
