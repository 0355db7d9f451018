//! Configuration-selected provider behavior.

use crate::error::ProviderError;
use oauth2::{AuthUrl, TokenUrl};
use serde::Deserialize;
use std::collections::BTreeMap;
use token_bridge_core::Result;

/// Known provider families. Each one only supplies defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    Quay,
    GitLab,
    /// Any other provider; endpoints must be configured explicitly.
    Generic,
}

impl ProviderKind {
    fn default_endpoints(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::GitHub => Some((
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
            )),
            Self::Quay => Some((
                "https://quay.io/oauth/authorize",
                "https://quay.io/oauth/access_token",
            )),
            Self::GitLab => Some((
                "https://gitlab.com/oauth/authorize",
                "https://gitlab.com/oauth/token",
            )),
            Self::Generic => None,
        }
    }

    fn default_client_auth(self) -> ClientAuth {
        match self {
            Self::GitHub | Self::Quay | Self::GitLab => ClientAuth::Body,
            Self::Generic => ClientAuth::Header,
        }
    }
}

/// How client credentials are presented at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuth {
    /// HTTP basic authentication header.
    Header,
    /// `client_id` and `client_secret` form parameters.
    Body,
}

/// Per-provider settings as they appear in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    /// Comma or whitespace separated scopes used when a state requests none.
    #[serde(default)]
    pub default_scopes: Option<String>,
    /// Extra form parameters sent with every code exchange.
    #[serde(default)]
    pub extra_exchange_params: BTreeMap<String, String>,
    #[serde(default)]
    pub client_auth: Option<ClientAuth>,
}

/// Resolved behavior of one configured provider.
#[derive(Debug, Clone)]
pub struct ProviderCapability {
    name: String,
    kind: ProviderKind,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    default_scopes: Vec<String>,
    extra_exchange_params: BTreeMap<String, String>,
    client_auth: ClientAuth,
}

impl ProviderCapability {
    /// Resolves settings against the defaults of their provider kind.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is missing or not a valid URL.
    pub fn from_settings(name: &str, settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let name = name.to_lowercase();
        let defaults = settings.kind.default_endpoints();
        let configuration = |details: String| ProviderError::Configuration {
            provider: name.clone(),
            details,
        };

        let auth_url = settings
            .auth_url
            .clone()
            .or_else(|| defaults.map(|(auth, _)| auth.to_string()))
            .ok_or_else(|| configuration("auth_url is required".to_string()))?;
        let token_url = settings
            .token_url
            .clone()
            .or_else(|| defaults.map(|(_, token)| token.to_string()))
            .ok_or_else(|| configuration("token_url is required".to_string()))?;

        let auth_url = AuthUrl::new(auth_url)
            .map_err(|e| configuration(format!("invalid auth_url: {e}")))?;
        let token_url = TokenUrl::new(token_url)
            .map_err(|e| configuration(format!("invalid token_url: {e}")))?;

        Ok(Self {
            kind: settings.kind,
            auth_url,
            token_url,
            default_scopes: split_scopes(settings.default_scopes.as_deref().unwrap_or_default()),
            extra_exchange_params: settings.extra_exchange_params.clone(),
            client_auth: settings
                .client_auth
                .unwrap_or_else(|| settings.kind.default_client_auth()),
            name,
        })
    }

    /// Lower-case provider name, as used in route paths.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[must_use]
    pub fn auth_url(&self) -> &AuthUrl {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &TokenUrl {
        &self.token_url
    }

    #[must_use]
    pub fn client_auth(&self) -> ClientAuth {
        self.client_auth
    }

    #[must_use]
    pub fn extra_exchange_params(&self) -> &BTreeMap<String, String> {
        &self.extra_exchange_params
    }

    /// Normalizes requested scopes.
    ///
    /// Entries may themselves hold several comma or whitespace separated
    /// scopes. The result is trimmed, de-duplicated in first-seen order, and
    /// falls back to the configured defaults when empty.
    #[must_use]
    pub fn normalize_scopes(&self, requested: &[String]) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in requested.iter().flat_map(|entry| split_scopes(entry)) {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        if scopes.is_empty() {
            self.default_scopes.clone()
        } else {
            scopes
        }
    }
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}
