//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the user id vouched for by a JWT Bearer token.
//! - [`auth::CurrentActor`] -- that user with its profile, as a policy
//!   [`Actor`](harmony_core::actor::Actor).
//! - [`webhook::ErpWebhookAuth`] -- the shared-secret check on ERP webhooks.

pub mod auth;
pub mod webhook;
