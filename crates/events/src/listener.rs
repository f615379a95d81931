//! Turns assignment events into notifications.

use tokio::sync::broadcast;

use crate::bus::{DomainEvent, PlatformEvent};
use crate::engine::NotificationEngine;

/// Background service consuming the event bus on behalf of the
/// [`NotificationEngine`].
pub struct NotificationListener;

impl NotificationListener {
    /// Run until the bus is closed (i.e. the [`EventBus`](crate::EventBus)
    /// is dropped).
    pub async fn run(engine: NotificationEngine, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::handle(&engine, &event.event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification listener lagged, some assignment notifications were not created"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification listener shutting down");
                    break;
                }
            }
        }
    }

    async fn handle(engine: &NotificationEngine, event: &DomainEvent) {
        let result = match event {
            DomainEvent::TaskAssigneesAdded { task_id, user_ids } => {
                engine.notify_task_assigned(*task_id, user_ids).await
            }
            DomainEvent::ProjectMembersAdded {
                project_id,
                user_ids,
            } => engine.notify_project_assigned(*project_id, user_ids).await,
            DomainEvent::ProjectLeadAssigned {
                project_id,
                lead_id,
            } => engine.notify_project_lead_assigned(*project_id, *lead_id).await,
            _ => return,
        };

        if let Err(e) = result {
            tracing::error!(event = event.name(), error = %e, "Failed to create assignment notifications");
        }
    }
}
