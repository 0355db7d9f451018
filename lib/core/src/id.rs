//! Identifiers minted by the server.
//!
//! A [`FlowKey`] correlates a pending provider login with the cluster
//! credential stored in the caller's session. It is the only piece of
//! session data that ever leaves the server, so it must be unguessable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Server-generated identifier of one pending login flow.
///
/// Serialized as the bare ULID string, which is also the key used in the
/// session flow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowKey(Ulid);

impl FlowKey {
    /// Mints a fresh flow key.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for FlowKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FlowKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_str(s).map(Self).map_err(|e| ParseIdError {
            id_type: "FlowKey",
            reason: e.to_string(),
        })
    }
}

impl From<Ulid> for FlowKey {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}
