//! Sync gateway to the external ERP.
//!
//! All ERP traffic goes through one [`SyncGateway`], constructed once at
//! process start and shared by reference. It owns:
//!
//! - the connection, established lazily on first use; a failed attempt is
//!   remembered until [`SyncGateway::reconnect`] is called,
//! - a throttle enforcing a minimum spacing between outbound calls,
//! - bounded retry with separate backoff for rate-limit responses,
//! - a TTL cache for partner and project reads,
//! - batch task creation.
//!
//! The wire protocol sits behind [`ErpConnector`] / [`ErpSession`];
//! [`transport::JsonRpcConnector`] speaks JSON-RPC `execute_kw`.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod records;
pub mod retry;
pub mod transport;

pub use config::ErpConfig;
pub use error::ErpError;
pub use gateway::{ErpConnector, ErpSession, SyncGateway};
