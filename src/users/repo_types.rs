use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RepoError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "standard" => Some(Role::Standard),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Deletion state of a stored user. A purged user has no row at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    SoftDeleted { at: OffsetDateTime },
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn deleted_at(&self) -> Option<OffsetDateTime> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::SoftDeleted { at } => Some(*at),
        }
    }
}

/// Whether a query sees soft-deleted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ActiveOnly,
    IncludingDeleted,
}

impl Visibility {
    pub fn admits(&self, lifecycle: &Lifecycle) -> bool {
        match self {
            Visibility::ActiveOnly => lifecycle.is_active(),
            Visibility::IncludingDeleted => true,
        }
    }
}

/// User record as the rest of the service sees it.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password_hash: String, // argon2 PHC string
    pub email: String,
    pub profile_picture: Option<String>,
    pub role: Role,
    pub lifecycle: Lifecycle,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub role: String,
    pub deleted_at: Option<OffsetDateTime>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&r.role).ok_or_else(|| {
            RepoError::Backend(format!("unknown role {:?} for user {}", r.role, r.id))
        })?;
        let lifecycle = match r.deleted_at {
            None => Lifecycle::Active,
            Some(at) => Lifecycle::SoftDeleted { at },
        };
        Ok(Self {
            id: r.id,
            name: r.name,
            username: r.username,
            password_hash: r.password_hash,
            email: r.email,
            profile_picture: r.profile_picture,
            role,
            lifecycle,
        })
    }
}
