//! Authorization error types.

use std::fmt;

/// Authorization errors.
///
/// A denied check is not an error; it is reported as `Ok(false)`. These
/// variants mean the question could not be answered at all.
#[derive(Debug)]
pub enum AuthzError {
    /// A client acting as the caller could not be built.
    ClientConfig {
        /// Error details.
        details: String,
    },
    /// The access review request failed.
    CheckFailed {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientConfig { details } => {
                write!(f, "failed to build cluster client for caller: {}", details)
            }
            Self::CheckFailed { details } => {
                write!(f, "access review request failed: {}", details)
            }
        }
    }
}

impl std::error::Error for AuthzError {}
