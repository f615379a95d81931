//! Document metadata model.

use harmony_core::document::DocumentType;
use harmony_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub file_url: String,
    pub doc_type: String,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for registering an uploaded file against a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub project_id: DbId,
    pub title: String,
    /// URL returned by the blob store.
    pub file_url: String,
    #[serde(default)]
    pub doc_type: DocumentType,
}
