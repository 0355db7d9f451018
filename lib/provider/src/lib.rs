//! OAuth2 service providers for token-bridge.
//!
//! Provider differences (endpoints, how the client authenticates at the
//! token endpoint, extra exchange parameters, scope handling) are data in a
//! [`ProviderCapability`] selected by configuration, not separate types.

mod capability;
mod client;
mod error;

pub use capability::{ClientAuth, ProviderCapability, ProviderKind, ProviderSettings};
pub use client::{ProviderClient, ProviderToken};
pub use error::ProviderError;
