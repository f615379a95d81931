use harmony_core::types::DbId;
use harmony_erp::ErpError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Erp(#[from] ErpError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },
}

impl SyncError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        SyncError::NotFound { entity, id }
    }

    /// The ERP is disabled or unreachable; the job should be skipped.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, SyncError::Erp(e) if e.is_not_configured())
    }
}
