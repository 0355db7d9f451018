//! Session error types.

use std::fmt;

/// Errors from session storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Stored session data could not be serialized or deserialized.
    Codec { key: String, details: String },
    /// The session backend failed.
    Backend { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec { key, details } => {
                write!(f, "failed to decode session value '{key}': {details}")
            }
            Self::Backend { details } => write!(f, "session backend error: {details}"),
        }
    }
}

impl std::error::Error for SessionError {}
