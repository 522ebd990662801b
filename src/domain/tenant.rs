//! Participant identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a tenant identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TenantIdError {
    #[error("tenant identity is empty")]
    Empty,
}

/// Identity of a participant (host or guest) in a room.
///
/// Authentication is an external collaborator; this type carries an
/// already-authenticated identity and only enforces non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, TenantIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TenantIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantId {
    type Err = TenantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenantId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty_identity() {
        let id = TenantId::new("host-1").unwrap();
        assert_eq!(id.as_str(), "host-1");
        assert_eq!(id.to_string(), "host-1");
    }

    #[test]
    fn rejects_empty_identity() {
        assert_eq!(TenantId::new(""), Err(TenantIdError::Empty));
        assert_eq!(TenantId::new("   "), Err(TenantIdError::Empty));
    }
}
