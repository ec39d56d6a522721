use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScribeError;

/// Opaque conversation identifier. Sessions have no record of their own;
/// a session exists as long as messages reference it.
pub type SessionId = String;

/// Mint a fresh session id (UUID v4, hyphenated).
pub fn new_session_id() -> SessionId {
    Uuid::new_v4().to_string()
}

/// Author of a stored message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Synthetic anchor written only by compaction.
    Summary,
}

impl Role {
    /// Roles that make up the visible conversation.
    pub const QUALIFYING: [Role; 2] = [Role::User, Role::Assistant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Summary => "summary",
        }
    }

    /// `user` and `assistant` qualify; `summary` never does.
    pub fn is_qualifying(&self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "summary" => Ok(Role::Summary),
            other => Err(ScribeError::Validation(format!("unknown role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::User, Role::Assistant, Role::Summary] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("system".parse::<Role>().is_err());
        assert!("User".parse::<Role>().is_err());
    }

    #[test]
    fn test_qualifying_roles() {
        assert!(Role::User.is_qualifying());
        assert!(Role::Assistant.is_qualifying());
        assert!(!Role::Summary.is_qualifying());
        assert!(Role::QUALIFYING.iter().all(Role::is_qualifying));
    }

    #[test]
    fn test_session_ids_are_uuids() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert_eq!(a.len(), 36);
    }
}
