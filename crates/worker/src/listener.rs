//! Runs sync jobs for mutations announced on the event bus.

use harmony_events::{DomainEvent, PlatformEvent};
use tokio::sync::broadcast;

use crate::sync::{SyncOutcome, Syncer};

/// Background service consuming the event bus on behalf of the ERP mirror.
pub struct SyncListener;

impl SyncListener {
    /// Run until the bus is closed.
    pub async fn run(syncer: Syncer, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::handle(&syncer, &event.event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Sync listener lagged, pending sync will pick up the missed entities"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, sync listener shutting down");
                    break;
                }
            }
        }
    }

    async fn handle(syncer: &Syncer, event: &DomainEvent) {
        let result = match event {
            DomainEvent::UserSaved { user_id } => syncer.sync_user(*user_id).await,
            DomainEvent::ProjectSaved { project_id } => syncer.sync_project(*project_id).await,
            DomainEvent::TaskSaved { task_id } => syncer.sync_task(*task_id).await,
            DomainEvent::UserDeleted {
                user_id,
                erp_partner_id: Some(partner_id),
            } => syncer.delete_partner(*user_id, *partner_id).await,
            _ => return,
        };

        match result {
            Ok(SyncOutcome::Skipped) => {}
            Ok(outcome) => {
                tracing::debug!(event = event.name(), ?outcome, "Sync job finished");
            }
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "Sync job failed");
            }
        }
    }
}
