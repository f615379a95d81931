//! Harmony domain events and the notification engine.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] / [`DomainEvent`] -- what mutations announce.
//! - [`NotificationEngine`] -- idempotent creation of deadline and
//!   assignment notifications.
//! - [`NotificationListener`] -- turns assignment events into notifications.
//! - [`DeadlineScheduler`] -- periodic deadline sweep.

pub mod bus;
pub mod engine;
pub mod listener;
pub mod scheduler;

pub use bus::{DomainEvent, EventBus, PlatformEvent};
pub use engine::{NotificationEngine, SweepReport};
pub use listener::NotificationListener;
pub use scheduler::DeadlineScheduler;
