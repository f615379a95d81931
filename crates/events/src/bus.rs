//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Project, task, and user mutations publish [`PlatformEvent`]s here
//! instead of triggering side effects inline. Listeners (notifications,
//! ERP sync) subscribe independently; a failing listener never affects the
//! mutation that published the event.

use chrono::{DateTime, Utc};
use harmony_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A project was created or updated.
    ProjectSaved { project_id: DbId },
    /// Users became members of a project.
    ProjectMembersAdded { project_id: DbId, user_ids: Vec<DbId> },
    /// A (new) lead was designated; their answer is pending.
    ProjectLeadAssigned { project_id: DbId, lead_id: DbId },
    /// A task was created or updated.
    TaskSaved { task_id: DbId },
    /// Users were newly assigned to a task.
    TaskAssigneesAdded { task_id: DbId, user_ids: Vec<DbId> },
    /// A user or its profile was created or updated.
    UserSaved { user_id: DbId },
    /// A user was removed. Carries the ERP partner id since the row is gone.
    UserDeleted {
        user_id: DbId,
        erp_partner_id: Option<DbId>,
    },
}

impl DomainEvent {
    /// Dot-separated name used in logs, e.g. `"task.assignees_added"`.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ProjectSaved { .. } => "project.saved",
            DomainEvent::ProjectMembersAdded { .. } => "project.members_added",
            DomainEvent::ProjectLeadAssigned { .. } => "project.lead_assigned",
            DomainEvent::TaskSaved { .. } => "task.saved",
            DomainEvent::TaskAssigneesAdded { .. } => "task.assignees_added",
            DomainEvent::UserSaved { .. } => "user.saved",
            DomainEvent::UserDeleted { .. } => "user.deleted",
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A [`DomainEvent`] plus who triggered it and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub event: DomainEvent,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            event,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }
}

impl From<DomainEvent> for PlatformEvent {
    fn from(event: DomainEvent) -> Self {
        Self::new(event)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
///
/// ```rust
/// use harmony_events::bus::{DomainEvent, EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(DomainEvent::TaskSaved { task_id: 1 }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: impl Into<PlatformEvent>) {
        let event = event.into();
        tracing::debug!(event = event.event.name(), "Publishing domain event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::new(DomainEvent::TaskAssigneesAdded {
                task_id: 42,
                user_ids: vec![7, 8],
            })
            .with_actor(3),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(
            received.event,
            DomainEvent::TaskAssigneesAdded {
                task_id: 42,
                user_ids: vec![7, 8]
            }
        );
        assert_eq!(received.actor_user_id, Some(3));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::ProjectSaved { project_id: 1 });

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event.name(), "project.saved");
        assert_eq!(e2.event.name(), "project.saved");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::UserSaved { user_id: 1 });
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(DomainEvent::ProjectLeadAssigned {
            project_id: 5,
            lead_id: 9,
        })
        .unwrap();
        assert_eq!(json["type"], "project_lead_assigned");
        assert_eq!(json["lead_id"], 9);
    }
}
