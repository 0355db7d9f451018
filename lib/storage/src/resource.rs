//! Target resource lookup.

use crate::error::StorageError;
use async_trait::async_trait;
use kube::Api;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use serde::Deserialize;
use token_bridge_authz::CredentialClients;
use token_bridge_core::Result;
use tracing::{debug, instrument};

/// The kind of resource tokens are stored against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name used in API paths.
    pub plural: String,
}

impl Default for ResourceKind {
    fn default() -> Self {
        Self {
            group: "appstudio.redhat.com".to_string(),
            version: "v1beta1".to_string(),
            kind: "SPIAccessToken".to_string(),
            plural: "spiaccesstokens".to_string(),
        }
    }
}

impl ResourceKind {
    fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(&self.group, &self.version, &self.kind),
            &self.plural,
        )
    }
}

/// A fetched resource, reduced to what is needed to reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResource {
    pub name: String,
    pub namespace: String,
    pub api_version: String,
    pub kind: String,
    pub uid: Option<String>,
}

/// Loads the resource a token will be stored against.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetches `namespace/name` acting as `credential`.
    async fn fetch(
        &self,
        credential: &str,
        namespace: &str,
        name: &str,
    ) -> Result<TargetResource, StorageError>;
}

/// [`ResourceFetcher`] reading a custom resource with the caller's credential.
#[derive(Clone)]
pub struct KubeResourceFetcher {
    clients: CredentialClients,
    api_resource: ApiResource,
}

impl KubeResourceFetcher {
    #[must_use]
    pub fn new(clients: CredentialClients, kind: &ResourceKind) -> Self {
        Self {
            clients,
            api_resource: kind.api_resource(),
        }
    }
}

#[async_trait]
impl ResourceFetcher for KubeResourceFetcher {
    #[instrument(skip(self, credential), fields(kind = %self.api_resource.kind))]
    async fn fetch(
        &self,
        credential: &str,
        namespace: &str,
        name: &str,
    ) -> Result<TargetResource, StorageError> {
        let fetch_error = |details: String| StorageError::Fetch {
            namespace: namespace.to_string(),
            name: name.to_string(),
            details,
        };

        let client = self
            .clients
            .client_for(credential)
            .map_err(|report| fetch_error(report.current_context().to_string()))?;

        let api: Api<DynamicObject> = Api::namespaced_with(client, namespace, &self.api_resource);
        let object = api
            .get(name)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        debug!(uid = ?object.metadata.uid, "target resource fetched");
        Ok(target_resource(&self.api_resource, object, namespace, name))
    }
}

fn target_resource(
    api_resource: &ApiResource,
    object: DynamicObject,
    namespace: &str,
    name: &str,
) -> TargetResource {
    TargetResource {
        name: object.metadata.name.unwrap_or_else(|| name.to_string()),
        namespace: object
            .metadata
            .namespace
            .unwrap_or_else(|| namespace.to_string()),
        api_version: api_resource.api_version.clone(),
        kind: api_resource.kind.clone(),
        uid: object.metadata.uid,
    }
}
