//! User roles and the coarse capabilities they imply.
//!
//! The string values must match the `CHECK` constraint on `profiles.role`
//! in `20260101000003_create_profiles.sql`.

string_enum! {
    /// The single role an actor holds at any time.
    Role {
        SuperAdmin = "super_admin",
        Admin = "admin",
        PoleLead = "pole_lead",
        Member = "member",
        Intern = "intern",
        Collaborator = "collaborator",
        Artist = "artist",
        Client = "client",
        Partner = "partner",
    }
}

impl Role {
    /// `admin` or `super_admin`.
    pub fn is_admin_tier(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Only `super_admin`. Gates project deletion.
    pub fn is_super_admin(self) -> bool {
        self == Role::SuperAdmin
    }

    /// Roles allowed to browse the user directory. External and junior
    /// roles only see people through the projects they belong to.
    pub fn can_browse_directory(self) -> bool {
        !matches!(
            self,
            Role::Intern | Role::Collaborator | Role::Partner | Role::Client
        )
    }
}
