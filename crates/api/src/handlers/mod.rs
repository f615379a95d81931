pub mod document;
pub mod notification;
pub mod pole;
pub mod project;
pub mod task;
pub mod user;
pub mod webhook;

use harmony_core::types::DbId;
use harmony_events::{DomainEvent, PlatformEvent};

use crate::state::AppState;

/// Publish `event` on behalf of `actor_id`. Listener failures never reach
/// the request that published.
pub(crate) fn publish(state: &AppState, actor_id: DbId, event: DomainEvent) {
    state
        .event_bus
        .publish(PlatformEvent::new(event).with_actor(actor_id));
}
