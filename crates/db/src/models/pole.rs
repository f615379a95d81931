//! Pole (department) model and DTOs.

use harmony_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `poles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pole {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub lead_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a pole.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePole {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub lead_id: Option<DbId>,
}

/// DTO for updating a pole. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub lead_id: Option<DbId>,
}
