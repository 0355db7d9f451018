//! Flow correlation on top of a [`SessionStore`].
//!
//! The flow map lives under a single session key as a JSON object of
//! `flow key -> cluster credential`.

use crate::error::SessionError;
use crate::session::SessionId;
use crate::store::SessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use token_bridge_core::{FlowKey, Result};
use tracing::{debug, instrument};

/// Session key holding the flow map.
const FLOWS_KEY: &str = "flows";

type FlowMap = HashMap<String, String>;

/// Maps pending flow keys to the credential that started each flow.
///
/// Writes go through [`SessionStore::update`], so concurrent flows in one
/// session never overwrite each other's entries.
#[derive(Clone)]
pub struct FlowCorrelator {
    store: Arc<dyn SessionStore>,
}

impl FlowCorrelator {
    /// Creates a correlator over the given session store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Whether `session` was issued by this store and is still live.
    pub async fn is_live(&self, session: &SessionId) -> Result<bool, SessionError> {
        self.store.exists(session).await
    }

    /// Records the credential for a new flow.
    #[instrument(skip(self, credential))]
    pub async fn put(
        &self,
        session: &SessionId,
        flow_key: FlowKey,
        credential: &str,
    ) -> Result<(), SessionError> {
        let mut pending = 0;
        let credential = credential.to_string();
        self.store
            .update(
                session,
                FLOWS_KEY,
                Box::new(|raw: Option<&str>| {
                    let mut flows = decode(raw)?;
                    flows.insert(flow_key.to_string(), credential);
                    pending = flows.len();
                    encode(&flows).map(Some)
                }),
            )
            .await?;

        debug!(%flow_key, pending, "flow stored");
        Ok(())
    }

    /// Looks up the credential for a flow.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        session: &SessionId,
        flow_key: FlowKey,
    ) -> Result<Option<String>, SessionError> {
        let raw = self.store.get(session, FLOWS_KEY).await?;
        let flows = decode(raw.as_deref())?;
        Ok(flows
            .get(&flow_key.to_string())
            .filter(|credential| !credential.is_empty())
            .cloned())
    }

    /// Forgets a flow. Returns whether an entry was removed.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        session: &SessionId,
        flow_key: FlowKey,
    ) -> Result<bool, SessionError> {
        let mut removed = false;
        self.store
            .update(
                session,
                FLOWS_KEY,
                Box::new(|raw: Option<&str>| {
                    let mut flows = decode(raw)?;
                    if flows.remove(&flow_key.to_string()).is_none() {
                        return Ok(None);
                    }
                    removed = true;
                    encode(&flows).map(Some)
                }),
            )
            .await?;

        if removed {
            debug!(%flow_key, "flow removed");
        }
        Ok(removed)
    }
}

fn decode(raw: Option<&str>) -> Result<FlowMap, SessionError> {
    let Some(raw) = raw else {
        return Ok(FlowMap::new());
    };
    serde_json::from_str(raw).map_err(|e| {
        SessionError::Codec {
            key: FLOWS_KEY.to_string(),
            details: e.to_string(),
        }
        .into()
    })
}

fn encode(flows: &FlowMap) -> Result<String, SessionError> {
    serde_json::to_string(flows).map_err(|e| {
        SessionError::Codec {
            key: FLOWS_KEY.to_string(),
            details: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use chrono::Duration;

    fn correlator() -> (FlowCorrelator, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new(Duration::minutes(5)));
        (FlowCorrelator::new(store.clone()), store)
    }

    #[tokio::test]
    async fn stored_credential_is_returned() {
        let (flows, _) = correlator();
        let session = SessionId::from("browser");
        let k1 = FlowKey::new();

        flows.put(&session, k1, "c1").await.expect("put");

        assert_eq!(
            flows.get(&session, k1).await.expect("get"),
            Some("c1".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_key_is_none() {
        let (flows, _) = correlator();
        let session = SessionId::from("browser");
        flows.put(&session, FlowKey::new(), "c1").await.expect("put");

        assert_eq!(flows.get(&session, FlowKey::new()).await.expect("get"), None);
    }

    #[tokio::test]
    async fn concurrent_flows_in_one_session_do_not_collide() {
        let (flows, _) = correlator();
        let session = SessionId::from("browser");
        let github = FlowKey::new();
        let quay = FlowKey::new();

        flows.put(&session, github, "cred-a").await.expect("put");
        flows.put(&session, quay, "cred-b").await.expect("put");

        assert_eq!(
            flows.get(&session, github).await.expect("get").as_deref(),
            Some("cred-a")
        );
        assert_eq!(
            flows.get(&session, quay).await.expect("get").as_deref(),
            Some("cred-b")
        );
    }

    #[tokio::test]
    async fn simultaneous_puts_keep_every_flow() {
        let (flows, _) = correlator();
        let session = SessionId::from("browser");
        let keys: Vec<FlowKey> = (0..16).map(|_| FlowKey::new()).collect();

        let tasks: Vec<_> = keys
            .iter()
            .map(|&key| {
                let flows = flows.clone();
                let session = session.clone();
                tokio::spawn(async move { flows.put(&session, key, "c").await })
            })
            .collect();
        for task in tasks {
            task.await.expect("join").expect("put");
        }

        for key in keys {
            assert!(flows.get(&session, key).await.expect("get").is_some());
        }
    }

    #[tokio::test]
    async fn flows_are_scoped_to_their_session() {
        let (flows, _) = correlator();
        let key = FlowKey::new();
        flows
            .put(&SessionId::from("one"), key, "c1")
            .await
            .expect("put");

        assert_eq!(
            flows.get(&SessionId::from("two"), key).await.expect("get"),
            None
        );
    }

    #[tokio::test]
    async fn removed_flow_is_gone() {
        let (flows, _) = correlator();
        let session = SessionId::from("browser");
        let key = FlowKey::new();
        flows.put(&session, key, "c1").await.expect("put");

        assert!(flows.remove(&session, key).await.expect("remove"));
        assert!(!flows.remove(&session, key).await.expect("remove"));
        assert_eq!(flows.get(&session, key).await.expect("get"), None);
    }

    #[tokio::test]
    async fn corrupt_flow_map_is_a_codec_error() {
        let (flows, store) = correlator();
        let session = SessionId::from("browser");
        store
            .put(&session, FLOWS_KEY, "not json".to_string())
            .await
            .expect("put");

        let err = flows.get(&session, FlowKey::new()).await.unwrap_err();
        assert!(matches!(err.current_context(), SessionError::Codec { .. }));

        let err = flows.put(&session, FlowKey::new(), "c1").await.unwrap_err();
        assert!(matches!(err.current_context(), SessionError::Codec { .. }));
        assert_eq!(
            store.get(&session, FLOWS_KEY).await.expect("get").as_deref(),
            Some("not json")
        );
    }

    #[tokio::test]
    async fn liveness_follows_the_store() {
        let (flows, _) = correlator();
        let session = SessionId::generate();
        assert!(!flows.is_live(&session).await.expect("live"));

        flows.put(&session, FlowKey::new(), "c1").await.expect("put");
        assert!(flows.is_live(&session).await.expect("live"));
    }
}
