//! Collaborator doubles shared by the flow and route tests.

use super::AppState;
use super::flow::{FlowController, FlowSettings};
use crate::config::SessionConfig;
use crate::template::RedirectTemplate;
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use token_bridge_authz::{AccessDescriptor, AccessGate, AuthzError};
use token_bridge_core::{FlowKey, Result};
use token_bridge_provider::{
    ClientAuth, ProviderCapability, ProviderClient, ProviderKind, ProviderSettings,
};
use token_bridge_session::{FlowCorrelator, MemorySessionStore, SessionId, SessionStore};
use token_bridge_state::{AnonymousState, KeyedState, StateCodec};
use token_bridge_storage::{
    MemoryTokenPersister, ResourceFetcher, StorageError, TargetResource, TokenPersister,
    TokenRecord,
};
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SIGNING_SECRET: &[u8] = b"test-signing-secret";
pub const AUTHORIZED_CREDENTIAL: &str = "cluster-token";
pub const BASE_URL: &str = "https://bridge.example/oauth";

/// Decision the access gate double returns.
#[derive(Debug, Clone, Copy)]
pub enum StubGate {
    Allow,
    Deny,
    Fail,
}

struct RecordingGate {
    decision: StubGate,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl AccessGate for RecordingGate {
    async fn check_access(
        &self,
        credential: &str,
        _namespace: &str,
        _descriptor: &AccessDescriptor,
    ) -> Result<bool, AuthzError> {
        self.seen.lock().await.push(credential.to_string());
        match self.decision {
            StubGate::Allow => Ok(true),
            StubGate::Deny => Ok(false),
            StubGate::Fail => Err(AuthzError::CheckFailed {
                details: "connection refused".to_string(),
            }
            .into()),
        }
    }
}

struct StubFetcher {
    fail: bool,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch(
        &self,
        credential: &str,
        namespace: &str,
        name: &str,
    ) -> Result<TargetResource, StorageError> {
        self.seen.lock().await.push(credential.to_string());
        if self.fail {
            return Err(StorageError::Fetch {
                namespace: namespace.to_string(),
                name: name.to_string(),
                details: "forbidden".to_string(),
            }
            .into());
        }

        Ok(TargetResource {
            name: name.to_string(),
            namespace: namespace.to_string(),
            api_version: "appstudio.redhat.com/v1beta1".to_string(),
            kind: "SPIAccessToken".to_string(),
            uid: Some("uid-1".to_string()),
        })
    }
}

struct FailingPersister;

#[async_trait]
impl TokenPersister for FailingPersister {
    async fn store(
        &self,
        resource: &TargetResource,
        _record: &TokenRecord,
    ) -> Result<(), StorageError> {
        Err(StorageError::Write {
            namespace: resource.namespace.clone(),
            name: resource.name.clone(),
            details: "secrets is forbidden".to_string(),
        }
        .into())
    }
}

/// Which collaborators of the harness misbehave.
#[derive(Default)]
struct Faults {
    fetch: bool,
    persist: bool,
    template: Option<RedirectTemplate>,
}

/// A controller wired to in-memory collaborators and a provider at `provider_uri`.
pub struct Harness {
    pub controller: FlowController,
    pub provider: ProviderClient,
    pub persister: MemoryTokenPersister,
    pub store: Arc<MemorySessionStore>,
    gate: Arc<RecordingGate>,
    fetcher: Arc<StubFetcher>,
}

impl Harness {
    pub fn new(decision: StubGate, provider_uri: &str) -> Self {
        Self::build(decision, provider_uri, Faults::default())
    }

    pub fn with_failing_fetcher(provider_uri: &str) -> Self {
        let faults = Faults {
            fetch: true,
            ..Faults::default()
        };
        Self::build(StubGate::Allow, provider_uri, faults)
    }

    /// Every Secret write is rejected; `persister` records nothing.
    pub fn with_failing_persister(provider_uri: &str) -> Self {
        let faults = Faults {
            persist: true,
            ..Faults::default()
        };
        Self::build(StubGate::Allow, provider_uri, faults)
    }

    pub fn with_template(provider_uri: &str, template: RedirectTemplate) -> Self {
        let faults = Faults {
            template: Some(template),
            ..Faults::default()
        };
        Self::build(StubGate::Allow, provider_uri, faults)
    }

    fn build(decision: StubGate, provider_uri: &str, faults: Faults) -> Self {
        let store = Arc::new(MemorySessionStore::new(ChronoDuration::minutes(30)));
        let gate = Arc::new(RecordingGate {
            decision,
            seen: Mutex::new(Vec::new()),
        });
        let fetcher = Arc::new(StubFetcher {
            fail: faults.fetch,
            seen: Mutex::new(Vec::new()),
        });
        let persister = MemoryTokenPersister::new();
        let writer: Arc<dyn TokenPersister> = if faults.persist {
            Arc::new(FailingPersister)
        } else {
            Arc::new(persister.clone())
        };
        let template = match faults.template {
            Some(template) => template,
            None => RedirectTemplate::builtin().expect("template"),
        };

        let controller = FlowController::new(
            codec(),
            FlowCorrelator::new(store.clone()),
            gate.clone(),
            fetcher.clone(),
            writer,
            template,
            FlowSettings {
                access: AccessDescriptor::default(),
                base_url: BASE_URL.to_string(),
                single_use_flows: true,
            },
        );

        Self {
            controller,
            provider: provider_client(provider_uri),
            persister,
            store,
            gate,
            fetcher,
        }
    }

    pub fn codec(&self) -> StateCodec {
        codec()
    }

    pub fn flows(&self) -> FlowCorrelator {
        FlowCorrelator::new(self.store.clone())
    }

    /// Signs the default anonymous state bound to `flow_key`.
    pub fn keyed_state(&self, flow_key: FlowKey) -> String {
        self.codec()
            .encode(&KeyedState::new(anonymous_state(), flow_key))
            .expect("encode")
    }

    /// Raw flow map of `session`, if one was ever written.
    pub async fn session_flows(&self, session: &SessionId) -> Option<String> {
        self.store.get(session, "flows").await.expect("session get")
    }

    pub async fn gate_credentials(&self) -> Vec<String> {
        self.gate.seen.lock().await.clone()
    }

    pub async fn fetched_with(&self) -> Vec<String> {
        self.fetcher.seen.lock().await.clone()
    }

    /// Consumes the harness into router state serving its provider as `quay`.
    pub fn into_app_state(self) -> (Arc<AppState>, MemoryTokenPersister, Arc<MemorySessionStore>) {
        let providers = HashMap::from([(self.provider.name().to_string(), self.provider)]);
        let session = SessionConfig {
            secure_cookies: false,
            ..SessionConfig::default()
        };

        (
            Arc::new(AppState::new(self.controller, providers, session)),
            self.persister,
            self.store,
        )
    }
}

fn codec() -> StateCodec {
    StateCodec::new(SIGNING_SECRET).expect("codec")
}

fn provider_client(provider_uri: &str) -> ProviderClient {
    let settings = ProviderSettings {
        kind: ProviderKind::Generic,
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        auth_url: Some(format!("{provider_uri}/authorize")),
        token_url: Some(format!("{provider_uri}/token")),
        default_scopes: None,
        extra_exchange_params: Default::default(),
        client_auth: Some(ClientAuth::Body),
    };
    let capability = ProviderCapability::from_settings("quay", &settings).expect("capability");

    ProviderClient::new(
        capability,
        settings.client_id.clone(),
        settings.client_secret.clone(),
        BASE_URL,
        Duration::from_secs(5),
    )
    .expect("provider client")
}

pub fn anonymous_state() -> AnonymousState {
    AnonymousState {
        token_name: "quay-token".to_string(),
        token_namespace: "team-a".to_string(),
        scopes: vec!["repo:read".to_string(), "user:read".to_string()],
        service_provider_type: "Quay".to_string(),
    }
}

/// Mounts a token endpoint issuing `T`/`R` for one hour, expected `calls` times.
pub async fn stub_token_endpoint(server: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "T",
            "token_type": "Bearer",
            "refresh_token": "R",
            "expires_in": 3600
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Mounts a token endpoint refusing every code as an expired grant.
pub async fn stub_rejecting_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "code expired"
        })))
        .expect(1)
        .mount(server)
        .await;
}
