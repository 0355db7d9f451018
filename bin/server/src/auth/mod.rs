//! The OAuth flow endpoints.
//!
//! A login is two requests from the same browser session:
//! - `{base}/{provider}/authenticate` checks the caller's cluster credential
//!   and sends them to the provider
//! - `{base}/{provider}/callback` receives the provider's code and stores the
//!   resulting token in the cluster
//!
//! The cluster credential never leaves the server. It is kept in the
//! session's flow map under a key, and only the key travels through the
//! provider inside the signed state.

pub mod credential;
pub mod flow;
pub mod routes;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::SessionConfig;
use crate::error::FlowError;
use std::collections::HashMap;
use token_bridge_provider::ProviderClient;

pub use flow::{FlowController, FlowSettings};
pub use routes::{router, with_middleware};

/// Shared application state.
pub struct AppState {
    /// Runs the flow.
    pub controller: FlowController,
    /// Configured providers, keyed by lower-case name.
    pub providers: HashMap<String, ProviderClient>,
    /// Session cookie settings.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        controller: FlowController,
        providers: HashMap<String, ProviderClient>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            controller,
            providers,
            session_config,
        }
    }

    /// Looks up a provider by its route name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::UnknownProvider`] if no provider has that name.
    pub fn provider(&self, name: &str) -> Result<&ProviderClient, FlowError> {
        self.providers
            .get(&name.to_lowercase())
            .ok_or_else(|| FlowError::UnknownProvider {
                provider: name.to_string(),
            })
    }
}
