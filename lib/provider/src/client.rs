//! Authorization URL construction and code exchange.

use crate::capability::{ClientAuth, ProviderCapability};
use crate::error::ProviderError;
use oauth2::basic::{BasicClient, BasicTokenType};
use oauth2::{
    AuthType, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse,
};
use std::time::Duration;
use token_bridge_core::Result;
use tracing::{debug, instrument};

/// Token obtained from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderToken {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    /// Lifetime reported by the provider, relative to the exchange.
    pub expires_in: Option<Duration>,
}

/// OAuth2 client for one configured provider.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    capability: ProviderCapability,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    http_client: reqwest::Client,
}

impl ProviderClient {
    /// Creates a client whose callback lives under `base_url`.
    ///
    /// The callback is `{base_url}/{provider}/callback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the callback URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        capability: ProviderCapability,
        client_id: String,
        client_secret: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let redirect_url = RedirectUrl::new(format!(
            "{}/{}/callback",
            base_url.trim_end_matches('/'),
            capability.name()
        ))
        .map_err(|e| ProviderError::Configuration {
            provider: capability.name().to_string(),
            details: format!("invalid callback URL: {e}"),
        })?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration {
                provider: capability.name().to_string(),
                details: format!("HTTP client error: {e}"),
            })?;

        Ok(Self {
            capability,
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            redirect_url,
            http_client,
        })
    }

    /// Lower-case provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.capability.name()
    }

    #[must_use]
    pub fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    /// The callback URL registered with the provider.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        self.redirect_url.as_str()
    }

    /// Builds the provider authorization URL carrying `state` and `scopes`.
    #[must_use]
    pub fn authorization_url(&self, state: &str, scopes: &[String]) -> String {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.capability.auth_url().clone())
            .set_redirect_uri(self.redirect_url.clone());

        let state = state.to_string();
        let (url, _) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(scopes.iter().cloned().map(Scope::new))
            .url();

        url.to_string()
    }

    /// Exchanges an authorization code for a token.
    ///
    /// `scope` is repeated on the exchange request. That is outside
    /// RFC 6749, but some providers (Quay) require it, and the rest ignore it.
    #[instrument(skip(self, code), fields(provider = %self.name()))]
    pub async fn exchange_code(
        &self,
        code: &str,
        scope: Option<&str>,
    ) -> Result<ProviderToken, ProviderError> {
        let auth_type = match self.capability.client_auth() {
            ClientAuth::Header => AuthType::BasicAuth,
            ClientAuth::Body => AuthType::RequestBody,
        };

        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_type(auth_type)
            .set_token_uri(self.capability.token_url().clone())
            .set_redirect_uri(self.redirect_url.clone());

        let mut request = client.exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(scope) = scope.filter(|scope| !scope.is_empty()) {
            request = request.add_extra_param("scope", scope.to_string());
        }
        for (name, value) in self.capability.extra_exchange_params() {
            request = request.add_extra_param(name.clone(), value.clone());
        }

        let response = request
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::Exchange {
                provider: self.name().to_string(),
                details: e.to_string(),
            })?;

        let token_type = match response.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        };

        debug!(
            token_type = %token_type,
            has_refresh_token = response.refresh_token().is_some(),
            "token exchange succeeded"
        );

        Ok(ProviderToken {
            access_token: response.access_token().secret().clone(),
            token_type,
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            expires_in: response.expires_in(),
        })
    }
}
