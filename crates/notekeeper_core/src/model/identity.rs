//! Identity model mirrored from the external identity provider.
//!
//! # Responsibility
//! - Define roles and the caller identity (`Actor`) passed to every operation.
//! - Define the local `User` row notes reference as their owner.
//!
//! # Invariants
//! - `Role` has exactly two values; anything else is rejected at parse time.
//! - `Actor` is built from an authenticated session, never from client input.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of an identity issued by the identity provider.
pub type UserId = Uuid;

/// Role claim carried by an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular account; sees and edits only its own notes.
    #[default]
    Member,
    /// Elevated account; sees every note and may restore or purge.
    Admin,
}

impl Role {
    /// Stable string id used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl Display for UnknownRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown role `{}`; expected member|admin", self.0)
    }
}

impl Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated caller of one note operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn member(user_id: UserId) -> Self {
        Self::new(user_id, Role::Member)
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Local identity row referenced by `notes.user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Creates a new identity row with a generated stable ID.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            created_at,
        }
    }

    /// Validates identity fields before persistence.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }

    pub fn summary(&self) -> OwnerSummary {
        OwnerSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Identity validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    InvalidEmail(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "user name must not be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for UserValidationError {}

/// Owner identity attached to notes for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}
