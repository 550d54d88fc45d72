//! User identities
//!
//! A user is keyed by a bank-issued `UserId`. Collaborators may also look a
//! user up by Discord handle; the kind of identifier is always carried
//! explicitly in a `UserRef` rather than inferred from the string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Unknown identifier kind '{0}' (expected 'discord:' or 'bank:')")]
    UnknownKind(String),
}

/// Opaque bank identity key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(id))
    }

    /// Issue a fresh bank id, e.g. `RPB-1A2B3C4D`
    pub fn generate() -> Self {
        Self(format!(
            "RPB-{}",
            uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Tagged lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UserRef {
    DiscordHandle(String),
    BankId(UserId),
}

impl UserRef {
    pub fn discord(handle: impl Into<String>) -> Self {
        UserRef::DiscordHandle(handle.into())
    }

    pub fn bank(id: UserId) -> Self {
        UserRef::BankId(id)
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        UserRef::BankId(id)
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::DiscordHandle(handle) => write!(f, "discord:{}", handle),
            UserRef::BankId(id) => write!(f, "bank:{}", id),
        }
    }
}

/// Parses `discord:<handle>` or `bank:<id>`
impl FromStr for UserRef {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| IdentityError::UnknownKind(s.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(IdentityError::Empty);
        }

        match kind.to_ascii_lowercase().as_str() {
            "discord" => Ok(UserRef::DiscordHandle(value.to_string())),
            "bank" => Ok(UserRef::BankId(UserId::new(value)?)),
            other => Err(IdentityError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_format() {
        let id = UserId::generate();
        assert!(id.as_str().starts_with("RPB-"));
        assert_eq!(id.as_str().len(), 12);
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(UserId::new("   "), Err(IdentityError::Empty));
    }

    #[test]
    fn test_user_ref_parse() {
        assert_eq!(
            "discord:alice#0001".parse::<UserRef>().unwrap(),
            UserRef::discord("alice#0001")
        );
        assert_eq!(
            "bank:RPB-00000001".parse::<UserRef>().unwrap(),
            UserRef::bank(UserId::new("RPB-00000001").unwrap())
        );
        assert!(matches!(
            "RPB-00000001".parse::<UserRef>(),
            Err(IdentityError::UnknownKind(_))
        ));
        assert!(matches!("email:x".parse::<UserRef>(), Err(IdentityError::UnknownKind(_))));
    }

    #[test]
    fn test_user_ref_display_roundtrips() {
        let r = UserRef::discord("bob");
        assert_eq!(r.to_string().parse::<UserRef>().unwrap(), r);
    }
}
