//! Token record persistence.

use crate::error::StorageError;
use crate::record::TokenRecord;
use crate::resource::TargetResource;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use token_bridge_core::Result;
use tracing::{info, instrument};

/// Field manager used for server-side apply.
const FIELD_MANAGER: &str = "token-bridge";

/// Label carrying the name of the resource a token secret belongs to.
pub const TOKEN_NAME_LABEL: &str = "token-bridge.io/token-name";

/// Durably records a token against a resource.
#[async_trait]
pub trait TokenPersister: Send + Sync {
    async fn store(&self, resource: &TargetResource, record: &TokenRecord)
    -> Result<(), StorageError>;
}

/// [`TokenPersister`] writing one `Secret` per target resource.
///
/// Writes use the service's own client, not the caller's: the caller proved
/// access through the review and the resource fetch, and is not expected to
/// be able to read or write the secret directly.
#[derive(Clone)]
pub struct SecretTokenPersister {
    client: Client,
    secret_name_suffix: String,
}

impl SecretTokenPersister {
    #[must_use]
    pub fn new(client: Client, secret_name_suffix: impl Into<String>) -> Self {
        Self {
            client,
            secret_name_suffix: secret_name_suffix.into(),
        }
    }
}

#[async_trait]
impl TokenPersister for SecretTokenPersister {
    #[instrument(skip(self, record), fields(namespace = %resource.namespace, name = %resource.name))]
    async fn store(
        &self,
        resource: &TargetResource,
        record: &TokenRecord,
    ) -> Result<(), StorageError> {
        let secret = token_secret(resource, record, &self.secret_name_suffix);
        let secret_name = secret.metadata.name.clone().unwrap_or_default();

        let api: Api<Secret> = Api::namespaced(self.client.clone(), &resource.namespace);
        api.patch(
            &secret_name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await
        .map_err(|e| StorageError::Write {
            namespace: resource.namespace.clone(),
            name: resource.name.clone(),
            details: e.to_string(),
        })?;

        info!(secret = %secret_name, "token data stored");
        Ok(())
    }
}

/// Builds the secret holding `record` for `resource`.
fn token_secret(resource: &TargetResource, record: &TokenRecord, suffix: &str) -> Secret {
    let owner_references = resource.uid.as_ref().map(|uid| {
        vec![OwnerReference {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
            name: resource.name.clone(),
            uid: uid.clone(),
            ..Default::default()
        }]
    });

    Secret {
        metadata: ObjectMeta {
            name: Some(format!("{}{}", resource.name, suffix)),
            namespace: Some(resource.namespace.clone()),
            labels: Some(BTreeMap::from([(
                TOKEN_NAME_LABEL.to_string(),
                resource.name.clone(),
            )])),
            owner_references,
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        string_data: Some(record.to_string_data()),
        ..Default::default()
    }
}
