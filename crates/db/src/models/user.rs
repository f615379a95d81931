//! User and profile models.

use harmony_core::actor::{Actor, Profile};
use harmony_core::roles::Role;
use harmony_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user joined with its (optional) profile.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserWithProfile {
    pub id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role: Option<String>,
    pub pole_id: Option<DbId>,
    pub client_type: Option<String>,
    pub phone: Option<String>,
    pub erp_partner_id: Option<DbId>,
}

impl UserWithProfile {
    /// Build the request principal. A missing or unreadable profile yields
    /// an actor without capabilities rather than an error.
    pub fn to_actor(&self) -> Actor {
        let profile = self.role.as_deref().and_then(|role| match role.parse::<Role>() {
            Ok(role) => Some(Profile {
                role,
                pole_id: self.pole_id,
                client_type: self.client_type.clone(),
            }),
            Err(e) => {
                tracing::warn!(user_id = self.id, error = %e, "Ignoring unreadable profile role");
                None
            }
        });
        Actor::new(self.id, profile)
    }
}

/// DTO for creating a user together with its profile.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    pub pole_id: Option<DbId>,
    pub client_type: Option<String>,
    pub phone: Option<String>,
}

/// DTO for admin changes to a profile. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub role: Option<Role>,
    pub pole_id: Option<DbId>,
    pub client_type: Option<String>,
    pub phone: Option<String>,
}
