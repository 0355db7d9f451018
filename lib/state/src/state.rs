//! State payload types.

use serde::{Deserialize, Serialize};
use token_bridge_core::FlowKey;

/// The state issued before any session correlation exists.
///
/// It names the cluster resource the provider token will be stored against
/// and the scopes to request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousState {
    /// Name of the target resource.
    pub token_name: String,
    /// Namespace of the target resource.
    pub token_namespace: String,
    /// Scopes to request from the provider.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Which configured provider the flow is for.
    pub service_provider_type: String,
}

/// An [`AnonymousState`] bound to a pending flow.
///
/// This is the payload sent to the provider as `state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedState {
    #[serde(flatten)]
    pub anonymous: AnonymousState,
    /// Key of the session flow map entry holding the caller's credential.
    pub key: FlowKey,
}

impl KeyedState {
    /// Binds an anonymous state to a flow key.
    #[must_use]
    pub fn new(anonymous: AnonymousState, key: FlowKey) -> Self {
        Self { anonymous, key }
    }
}
