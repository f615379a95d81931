//! Domain rules for the Harmony project-management backend.
//!
//! This crate is pure: no I/O, no async. Everything that decides *whether*
//! something may happen lives here so the HTTP handlers, the webhook
//! receiver, and the background jobs all consult the same rules.
//!
//! - [`roles`] / [`actor`] -- who is asking, and what their role implies.
//! - [`access`] -- visibility and management policy for projects, tasks,
//!   poles, users, and documents.
//! - [`project`] -- project lifecycle and the lead acceptance handshake.
//! - [`task`] -- task status, priority, and assignee bookkeeping.
//! - [`notification`] -- notification kinds, deadline windows, and content.

#[macro_use]
mod macros;

pub mod access;
pub mod actor;
pub mod document;
pub mod error;
pub mod notification;
pub mod project;
pub mod roles;
pub mod task;
pub mod types;
