//! The authenticated principal a request acts on behalf of.
//!
//! The identity provider only vouches for a user id. Role and pole come
//! from the user's profile row, which may be missing; an actor without a
//! profile holds no capabilities at all (fail-closed, never an error).

use serde::Serialize;

use crate::roles::Role;
use crate::types::DbId;

/// Role-bearing profile attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub role: Role,
    pub pole_id: Option<DbId>,
    pub client_type: Option<String>,
}

/// A user identity plus its optional profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: DbId,
    pub profile: Option<Profile>,
}

impl Actor {
    pub fn new(user_id: DbId, profile: Option<Profile>) -> Self {
        Self { user_id, profile }
    }

    /// Shorthand for an actor with a profile and no client type.
    pub fn with_role(user_id: DbId, role: Role, pole_id: Option<DbId>) -> Self {
        Self::new(
            user_id,
            Some(Profile {
                role,
                pole_id,
                client_type: None,
            }),
        )
    }

    /// An actor whose profile row does not exist.
    pub fn without_profile(user_id: DbId) -> Self {
        Self::new(user_id, None)
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    pub fn pole_id(&self) -> Option<DbId> {
        self.profile.as_ref().and_then(|p| p.pole_id)
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    pub fn is_admin_tier(&self) -> bool {
        self.role().is_some_and(Role::is_admin_tier)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role().is_some_and(Role::is_super_admin)
    }

    pub fn is_pole_lead(&self) -> bool {
        self.role() == Some(Role::PoleLead)
    }

    /// True when the actor is a pole lead *with* a pole, and that pole is
    /// `pole_id`. A pole lead without a pole leads nothing.
    pub fn leads_pole(&self, pole_id: Option<DbId>) -> bool {
        match (self.is_pole_lead(), self.pole_id(), pole_id) {
            (true, Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }

    /// Same user id.
    pub fn is(&self, user_id: Option<DbId>) -> bool {
        user_id == Some(self.user_id)
    }
}

/// `true` iff the actor's role is `admin` or `super_admin`.
pub fn is_admin_tier(actor: &Actor) -> bool {
    actor.is_admin_tier()
}

/// `true` iff the actor's role is exactly `super_admin`.
pub fn is_super_admin(actor: &Actor) -> bool {
    actor.is_super_admin()
}
