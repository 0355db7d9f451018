//! Provider error types.

use std::fmt;

/// Errors from provider configuration and token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider configuration is incomplete or invalid.
    Configuration { provider: String, details: String },
    /// The authorization code could not be exchanged for a token.
    Exchange { provider: String, details: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { provider, details } => {
                write!(f, "provider '{provider}' is misconfigured: {details}")
            }
            Self::Exchange { provider, details } => {
                write!(f, "token exchange with '{provider}' failed: {details}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}
