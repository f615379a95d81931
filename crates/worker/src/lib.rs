//! ERP synchronization jobs.
//!
//! - [`Syncer`] -- push one user, project, or task to the ERP.
//! - [`batch_sync_pending`] -- bounded reconciliation of everything not
//!   yet mirrored.
//! - [`SyncListener`] -- runs sync jobs for mutations announced on the
//!   event bus.
//! - [`PendingSyncScheduler`] -- periodic [`batch_sync_pending`].
//!
//! Sync is best-effort: failures are logged by the caller and never roll
//! back the local mutation that triggered them.

pub mod batch;
pub mod error;
pub mod listener;
pub mod scheduler;
pub mod sync;

pub use batch::{batch_sync_pending, BatchReport};
pub use error::SyncError;
pub use listener::SyncListener;
pub use scheduler::PendingSyncScheduler;
pub use sync::{SyncOutcome, Syncer};
