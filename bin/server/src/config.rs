//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, using `__` as
//! the nesting separator (e.g. `SESSION__TTL_MINUTES`,
//! `PROVIDERS__GITHUB__CLIENT_ID`).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use token_bridge_authz::AccessDescriptor;
use token_bridge_provider::ProviderSettings;
use token_bridge_storage::ResourceKind;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public URL the flow endpoints are served under.
    ///
    /// Its path is the route prefix, and provider callbacks are registered
    /// as `{base_url}/{provider}/callback`.
    pub base_url: String,

    /// Secret used to sign OAuth state.
    #[serde(default)]
    pub state_signing_secret: Option<String>,

    /// File holding the state signing secret. Used when
    /// `state_signing_secret` is unset.
    #[serde(default)]
    pub state_signing_secret_file: Option<PathBuf>,

    /// Handlebars template for the redirect notice page.
    #[serde(default)]
    pub redirect_template_file: Option<PathBuf>,

    /// HTTP serving configuration.
    #[serde(default)]
    pub server: HttpConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Cluster access configuration.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Configured service providers, keyed by route name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

/// HTTP serving configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Upper bound on handling one request, outbound calls included.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes. Pending flows die with their session.
    #[serde(default = "default_session_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Interval between expired-session sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Whether a flow key is forgotten once its token has been stored.
    #[serde(default = "default_single_use_flows")]
    pub single_use_flows: bool,
}

/// Cluster-side configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Operation the caller must be allowed to perform before a login starts.
    #[serde(default)]
    pub access: AccessDescriptor,

    /// Kind of the resource tokens are stored against.
    #[serde(default)]
    pub token_resource: ResourceKind,

    /// Suffix appended to the resource name to name its token secret.
    #[serde(default = "default_secret_name_suffix")]
    pub secret_name_suffix: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_session_ttl_minutes() -> i64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

fn default_single_use_flows() -> bool {
    true
}

fn default_secret_name_suffix() -> String {
    "-token-data".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
            single_use_flows: default_single_use_flows(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            access: AccessDescriptor::default(),
            token_resource: ResourceKind::default(),
            secret_name_suffix: default_secret_name_suffix(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Returns the state signing secret, reading the secret file if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source is configured or the file is unreadable.
    pub fn signing_secret(&self) -> Result<Vec<u8>, config::ConfigError> {
        if let Some(secret) = &self.state_signing_secret {
            return Ok(secret.as_bytes().to_vec());
        }

        let path = self.state_signing_secret_file.as_ref().ok_or_else(|| {
            config::ConfigError::Message(
                "one of state_signing_secret or state_signing_secret_file is required"
                    .to_string(),
            )
        })?;

        let secret = std::fs::read(path).map_err(|e| {
            config::ConfigError::Message(format!(
                "failed to read state signing secret from {}: {}",
                path.display(),
                e
            ))
        })?;

        // Secret files usually end with a newline that is not part of the key.
        Ok(secret.trim_ascii_end().to_vec())
    }

    /// Returns the route prefix derived from `base_url`, without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn base_path(&self) -> Result<String, config::ConfigError> {
        let url = oauth2::url::Url::parse(&self.base_url).map_err(|e| {
            config::ConfigError::Message(format!("invalid base_url '{}': {}", self.base_url, e))
        })?;

        Ok(url.path().trim_end_matches('/').to_string())
    }
}
