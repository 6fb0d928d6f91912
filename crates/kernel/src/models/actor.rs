//! Actor and role model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anonymous actor UUID (nil UUID).
pub const ANONYMOUS_ACTOR_ID: Uuid = Uuid::nil();

/// Site role. Closed set; anything unrecognised resolves to `Viewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "user")]
    Viewer,
    Author,
    #[serde(alias = "admin")]
    Administrator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Author => "author",
            Role::Administrator => "administrator",
        }
    }

    /// Parse a stored role value, falling back to least privilege.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or(Role::Viewer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" | "user" => Ok(Role::Viewer),
            "author" => Ok(Role::Author),
            "administrator" | "admin" => Ok(Role::Administrator),
            other => anyhow::bail!("unknown role '{other}'"),
        }
    }
}

/// The user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// The anonymous viewer used when no session is available.
    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS_ACTOR_ID,
            role: Role::Viewer,
        }
    }

    /// Check if this is the anonymous actor.
    pub fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS_ACTOR_ID
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_roles_and_aliases() {
        assert_eq!("author".parse::<Role>().unwrap(), Role::Author);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Administrator);
        assert_eq!("user".parse::<Role>().unwrap(), Role::Viewer);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn unknown_stored_role_is_viewer() {
        assert_eq!(Role::from_stored("superuser"), Role::Viewer);
        assert_eq!(Role::from_stored("administrator"), Role::Administrator);
    }

    #[test]
    fn role_serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&Role::Administrator).unwrap(),
            "\"administrator\""
        );
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Administrator
        );
    }

    #[test]
    fn anonymous_actor_is_a_viewer() {
        let actor = Actor::anonymous();
        assert!(actor.is_anonymous());
        assert_eq!(actor.role, Role::Viewer);
        assert!(!actor.is_admin());
    }
}
