//! Session identifiers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use token_bridge_core::ParseIdError;
use ulid::Ulid;

/// Opaque identifier of one browser session.
///
/// Carried in the session cookie; never derived from request content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from an existing value (e.g. a cookie).
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts only the shape [`SessionId::generate`] produces.
impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_str(s)
            .map(|ulid| Self(ulid.to_string()))
            .map_err(|e| ParseIdError {
                id_type: "SessionId",
                reason: e.to_string(),
            })
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
