//! Storage error types.

use std::fmt;

/// Errors from fetching the target resource or writing token data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The target resource could not be read.
    Fetch {
        namespace: String,
        name: String,
        details: String,
    },
    /// The token record could not be written.
    Write {
        namespace: String,
        name: String,
        details: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch {
                namespace,
                name,
                details,
            } => write!(f, "failed to read '{namespace}/{name}': {details}"),
            Self::Write {
                namespace,
                name,
                details,
            } => write!(f, "failed to write token data for '{namespace}/{name}': {details}"),
        }
    }
}

impl std::error::Error for StorageError {}
