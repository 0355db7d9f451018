//! In-memory token persistence.

use crate::error::StorageError;
use crate::persister::TokenPersister;
use crate::record::TokenRecord;
use crate::resource::TargetResource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use token_bridge_core::Result;
use tokio::sync::RwLock;

/// [`TokenPersister`] holding the latest record per `(namespace, name)`.
///
/// Nothing survives a restart. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenPersister {
    records: Arc<RwLock<HashMap<(String, String), TokenRecord>>>,
    writes: Arc<RwLock<usize>>,
}

impl MemoryTokenPersister {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record stored for `namespace/name`, if any.
    pub async fn get(&self, namespace: &str, name: &str) -> Option<TokenRecord> {
        self.records
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of successful writes, overwrites included.
    pub async fn writes(&self) -> usize {
        *self.writes.read().await
    }
}

#[async_trait]
impl TokenPersister for MemoryTokenPersister {
    async fn store(
        &self,
        resource: &TargetResource,
        record: &TokenRecord,
    ) -> Result<(), StorageError> {
        self.records.write().await.insert(
            (resource.namespace.clone(), resource.name.clone()),
            record.clone(),
        );
        *self.writes.write().await += 1;
        Ok(())
    }
}
