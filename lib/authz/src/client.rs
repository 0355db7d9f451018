//! Access review client.

use crate::error::AuthzError;
use crate::types::AccessDescriptor;
use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::api::PostParams;
use kube::config::AuthInfo;
use kube::{Api, Client, Config};
use token_bridge_core::Result;
use tracing::{debug, instrument};

/// Decides whether a credential may perform an operation in a namespace.
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Returns `Ok(true)` if allowed, `Ok(false)` if denied.
    ///
    /// # Errors
    ///
    /// Returns an error only when the check itself could not be performed.
    async fn check_access(
        &self,
        credential: &str,
        namespace: &str,
        descriptor: &AccessDescriptor,
    ) -> Result<bool, AuthzError>;
}

/// Builds cluster clients that authenticate as a caller-supplied bearer token.
///
/// Connection settings (server URL, CA bundle, proxy) come from the base
/// config; its own authentication is discarded.
#[derive(Clone)]
pub struct CredentialClients {
    base: Config,
}

impl CredentialClients {
    /// Creates a factory from the service's own cluster config.
    #[must_use]
    pub fn new(base: Config) -> Self {
        Self { base }
    }

    /// Returns a client whose every request carries `credential`.
    pub fn client_for(&self, credential: &str) -> Result<Client, AuthzError> {
        let mut config = self.base.clone();
        config.auth_info = AuthInfo {
            token: Some(credential.to_string().into()),
            ..AuthInfo::default()
        };

        Client::try_from(config).map_err(|e| {
            AuthzError::ClientConfig {
                details: e.to_string(),
            }
            .into()
        })
    }
}

/// [`AccessGate`] backed by `SelfSubjectAccessReview`.
#[derive(Clone)]
pub struct KubeAccessGate {
    clients: CredentialClients,
}

impl KubeAccessGate {
    /// Creates a gate that reviews access as each caller.
    #[must_use]
    pub fn new(clients: CredentialClients) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl AccessGate for KubeAccessGate {
    #[instrument(skip(self, credential, descriptor), fields(descriptor = %descriptor))]
    async fn check_access(
        &self,
        credential: &str,
        namespace: &str,
        descriptor: &AccessDescriptor,
    ) -> Result<bool, AuthzError> {
        let client = self.clients.client_for(credential)?;
        let api: Api<SelfSubjectAccessReview> = Api::all(client);

        let review = api
            .create(&PostParams::default(), &self_review(namespace, descriptor))
            .await
            .map_err(|e| AuthzError::CheckFailed {
                details: e.to_string(),
            })?;

        let allowed = is_allowed(&review);
        debug!(allowed, "self subject access review result");

        Ok(allowed)
    }
}

/// Builds the review asking whether the caller may perform `descriptor` in `namespace`.
fn self_review(namespace: &str, descriptor: &AccessDescriptor) -> SelfSubjectAccessReview {
    SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(ResourceAttributes {
                namespace: Some(namespace.to_string()),
                verb: Some(descriptor.verb.clone()),
                group: Some(descriptor.group.clone()),
                version: Some(descriptor.version.clone()),
                resource: Some(descriptor.resource.clone()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn is_allowed(review: &SelfSubjectAccessReview) -> bool {
    review.status.as_ref().is_some_and(|status| status.allowed)
}
