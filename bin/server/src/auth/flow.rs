//! The two-phase OAuth flow.
//!
//! `initiate` checks the caller's cluster credential, parks it in the
//! session under a fresh [`FlowKey`] and sends the caller to the provider.
//! `finish` recovers the credential through the key carried in the signed
//! state, exchanges the code and stores the token against the target
//! resource.

use super::credential;
use crate::error::FlowError;
use crate::template::RedirectTemplate;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use token_bridge_authz::{AccessDescriptor, AccessGate};
use token_bridge_core::FlowKey;
use token_bridge_provider::{ProviderClient, ProviderToken};
use token_bridge_session::{FlowCorrelator, SessionId};
use token_bridge_state::{KeyedState, StateCodec};
use token_bridge_storage::{ResourceFetcher, TokenPersister, TokenRecord};
use tracing::{debug, info, instrument, warn};

/// Parameters of `{provider}/authenticate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthenticateParams {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub k8s_token: Option<String>,
}

/// Parameters of `{provider}/callback`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub redirect_after_login: Option<String>,
}

/// Result of a successful `initiate`.
#[derive(Debug, Clone)]
pub struct RedirectNotice {
    pub authorization_url: String,
    pub page: String,
}

/// How the callback's state and code resolved.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// The flow was known and the provider issued a token.
    Authenticated {
        state: KeyedState,
        token: ProviderToken,
        credential: String,
    },
    /// The flow key has no credential in this session.
    AuthorizationRequired,
}

/// Settings of the flow independent of any provider.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Operation the caller must be allowed to perform.
    pub access: AccessDescriptor,
    /// Public URL the flow endpoints live under.
    pub base_url: String,
    /// Forget a flow key once its token is stored.
    pub single_use_flows: bool,
}

/// Runs the flow against explicit collaborators.
pub struct FlowController {
    codec: StateCodec,
    flows: FlowCorrelator,
    gate: Arc<dyn AccessGate>,
    fetcher: Arc<dyn ResourceFetcher>,
    persister: Arc<dyn TokenPersister>,
    template: RedirectTemplate,
    settings: FlowSettings,
}

impl FlowController {
    #[must_use]
    pub fn new(
        codec: StateCodec,
        flows: FlowCorrelator,
        gate: Arc<dyn AccessGate>,
        fetcher: Arc<dyn ResourceFetcher>,
        persister: Arc<dyn TokenPersister>,
        template: RedirectTemplate,
        settings: FlowSettings,
    ) -> Self {
        Self {
            codec,
            flows,
            gate,
            fetcher,
            persister,
            template,
            settings,
        }
    }

    /// Picks the session for a request presenting `cookie`.
    ///
    /// A cookie is reused only when it names a live session this server
    /// issued. Anything else gets a freshly generated id.
    ///
    /// # Errors
    ///
    /// Fails when the session store cannot be consulted.
    pub async fn session(&self, cookie: Option<&str>) -> Result<SessionId, FlowError> {
        let Some(value) = cookie.filter(|value| !value.is_empty()) else {
            return Ok(SessionId::generate());
        };

        if let Ok(candidate) = value.parse::<SessionId>() {
            let live = self
                .flows
                .is_live(&candidate)
                .await
                .map_err(|e| FlowError::SessionCodec {
                    details: e.current_context().to_string(),
                })?;
            if live {
                return Ok(candidate);
            }
        }

        debug!("unknown session cookie replaced");
        Ok(SessionId::generate())
    }

    /// Starts a flow and renders the page sending the caller to the provider.
    ///
    /// `authorization` is the raw `Authorization` header, consulted when the
    /// form carries no `k8s_token`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid state, a missing or unauthorized credential, or
    /// when the flow cannot be recorded or the page rendered.
    #[instrument(skip_all, fields(provider = %provider.name(), session = %session))]
    pub async fn initiate(
        &self,
        provider: &ProviderClient,
        session: &SessionId,
        params: &AuthenticateParams,
        authorization: Option<&str>,
    ) -> Result<RedirectNotice, FlowError> {
        let anonymous =
            self.codec
                .parse_anonymous(&params.state)
                .map_err(|e| FlowError::StateDecode {
                    details: e.current_context().to_string(),
                })?;

        let credential = credential::resolve(params.k8s_token.as_deref(), authorization)
            .ok_or(FlowError::MissingCredential)?;

        let allowed = self
            .gate
            .check_access(
                &credential,
                &anonymous.token_namespace,
                &self.settings.access,
            )
            .await
            .map_err(|e| FlowError::AccessCheck {
                details: e.current_context().to_string(),
            })?;
        if !allowed {
            return Err(FlowError::AccessDenied);
        }

        let flow_key = FlowKey::new();
        self.flows
            .put(session, flow_key, &credential)
            .await
            .map_err(|e| FlowError::SessionCodec {
                details: e.current_context().to_string(),
            })?;

        let scopes = provider.capability().normalize_scopes(&anonymous.scopes);
        let state = self
            .codec
            .encode(&KeyedState::new(anonymous, flow_key))
            .map_err(|e| FlowError::StateEncode {
                details: e.current_context().to_string(),
            })?;

        let authorization_url = provider.authorization_url(&state, &scopes);
        let page = self
            .template
            .render(&authorization_url)
            .map_err(|e| FlowError::Render {
                details: e.current_context().to_string(),
            })?;

        debug!(%flow_key, "flow initiated");
        Ok(RedirectNotice {
            authorization_url,
            page,
        })
    }

    /// Resolves the callback's flow and exchanges its code.
    ///
    /// The flow key is looked up before the code is used, so an unknown
    /// flow never reaches the provider.
    ///
    /// # Errors
    ///
    /// Fails on an invalid state, an unreadable flow map, or a rejected
    /// exchange.
    pub async fn exchange(
        &self,
        provider: &ProviderClient,
        session: &SessionId,
        params: &CallbackParams,
    ) -> Result<ExchangeOutcome, FlowError> {
        let state: KeyedState =
            self.codec
                .parse_into(&params.state)
                .map_err(|e| FlowError::StateDecode {
                    details: e.current_context().to_string(),
                })?;

        let credential = self
            .flows
            .get(session, state.key)
            .await
            .map_err(|e| FlowError::SessionCodec {
                details: e.current_context().to_string(),
            })?;
        let Some(credential) = credential else {
            return Ok(ExchangeOutcome::AuthorizationRequired);
        };

        let token = provider
            .exchange_code(&params.code, params.scope.as_deref())
            .await
            .map_err(|e| FlowError::ProviderExchange {
                details: e.current_context().to_string(),
            })?;

        Ok(ExchangeOutcome::Authenticated {
            state,
            token,
            credential,
        })
    }

    /// Completes a flow and returns where to send the browser.
    ///
    /// # Errors
    ///
    /// Fails as [`Self::exchange`] does, with
    /// [`FlowError::AuthorizationRequired`] for an unknown flow, and when the
    /// target resource cannot be read or the token written.
    #[instrument(skip_all, fields(provider = %provider.name(), session = %session))]
    pub async fn finish(
        &self,
        provider: &ProviderClient,
        session: &SessionId,
        params: &CallbackParams,
    ) -> Result<String, FlowError> {
        let (state, token, credential) = match self.exchange(provider, session, params).await? {
            ExchangeOutcome::Authenticated {
                state,
                token,
                credential,
            } => (state, token, credential),
            ExchangeOutcome::AuthorizationRequired => {
                return Err(FlowError::AuthorizationRequired);
            }
        };

        let resource = self
            .fetcher
            .fetch(
                &credential,
                &state.anonymous.token_namespace,
                &state.anonymous.token_name,
            )
            .await
            .map_err(|e| FlowError::Persistence {
                details: e.current_context().to_string(),
            })?;

        let record = normalize_token(&token, Utc::now());
        self.persister
            .store(&resource, &record)
            .await
            .map_err(|e| FlowError::Persistence {
                details: e.current_context().to_string(),
            })?;

        info!(
            namespace = %resource.namespace,
            name = %resource.name,
            "provider token stored"
        );

        if self.settings.single_use_flows {
            // The token is already stored; a stale entry only lingers until the session expires.
            if let Err(e) = self.flows.remove(session, state.key).await {
                warn!(flow_key = %state.key, error = %e, "failed to forget completed flow");
            }
        }

        Ok(params
            .redirect_after_login
            .clone()
            .filter(|location| !location.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{}/callback_success",
                    self.settings.base_url.trim_end_matches('/')
                )
            }))
    }
}

/// Converts a provider token into the stored record.
///
/// Expiry becomes seconds since the epoch, or `0` when the provider gave none.
#[must_use]
pub fn normalize_token(token: &ProviderToken, now: DateTime<Utc>) -> TokenRecord {
    let expiry = token.expires_in.map_or(0, |expires_in| {
        u64::try_from(now.timestamp())
            .unwrap_or(0)
            .saturating_add(expires_in.as_secs())
    });

    TokenRecord {
        access_token: token.access_token.clone(),
        token_type: token.token_type.clone(),
        refresh_token: token.refresh_token.clone().unwrap_or_default(),
        expiry,
    }
}
