//! State codec error types.

use std::fmt;

/// Errors from signing or verifying state payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The codec was constructed without a signing secret.
    EmptySecret,
    /// The payload could not be signed.
    EncodingFailed { details: String },
    /// The inbound string is malformed, forged, or signed with another key.
    Invalid { details: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "state signing secret must not be empty"),
            Self::EncodingFailed { details } => {
                write!(f, "failed to sign state: {details}")
            }
            Self::Invalid { details } => write!(f, "invalid state: {details}"),
        }
    }
}

impl std::error::Error for StateError {}
