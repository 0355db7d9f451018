//! Classified failures of the OAuth flow endpoints.
//!
//! Every failure ends the request. The response is a plain-text
//! `"{message}: {detail}"` body with the status of its kind, and the same
//! message is logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// A terminal failure of `authenticate` or `callback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The `{provider}` path segment names no configured provider.
    UnknownProvider { provider: String },
    /// The query string or form body could not be read.
    InvalidRequest { details: String },
    /// The inbound `state` is malformed or not signed by us.
    StateDecode { details: String },
    /// The keyed state could not be signed.
    StateEncode { details: String },
    /// No cluster credential was supplied.
    MissingCredential,
    /// The access review itself failed.
    AccessCheck { details: String },
    /// The access review denied the credential.
    AccessDenied,
    /// The session flow map could not be read or written.
    SessionCodec { details: String },
    /// The redirect notice page could not be rendered.
    Render { details: String },
    /// The flow key has no credential in this session.
    AuthorizationRequired,
    /// The provider rejected the code exchange.
    ProviderExchange { details: String },
    /// The target resource could not be read or the token not written.
    Persistence { details: String },
}

impl FlowError {
    /// HTTP status for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownProvider { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest { .. }
            | Self::StateDecode { .. }
            | Self::ProviderExchange { .. } => StatusCode::BAD_REQUEST,
            Self::MissingCredential | Self::AccessDenied | Self::AuthorizationRequired => {
                StatusCode::UNAUTHORIZED
            }
            Self::StateEncode { .. }
            | Self::AccessCheck { .. }
            | Self::SessionCodec { .. }
            | Self::Render { .. }
            | Self::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::UnknownProvider { .. } => "unknown service provider",
            Self::InvalidRequest { .. } => "failed to parse request parameters",
            Self::StateDecode { .. } => "failed to decode the OAuth state",
            Self::StateEncode { .. } => "failed to encode OAuth state",
            Self::MissingCredential => {
                "failed to extract authorization info from either headers or form/query parameters"
            }
            Self::AccessCheck { .. } => "failed to determine if the authenticated user has access",
            Self::AccessDenied => "authenticating the request in Kubernetes unsuccessful",
            Self::SessionCodec { .. } => "failed to access session data",
            Self::Render { .. } => "failed to return redirect notice HTML page",
            Self::AuthorizationRequired => "could not authenticate to Kubernetes",
            Self::ProviderExchange { .. } => "error in service provider token exchange",
            Self::Persistence { .. } => "failed to store token data to cluster",
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Self::UnknownProvider { provider } => Some(provider.as_str()),
            Self::InvalidRequest { details }
            | Self::StateDecode { details }
            | Self::StateEncode { details }
            | Self::AccessCheck { details }
            | Self::SessionCodec { details }
            | Self::Render { details }
            | Self::ProviderExchange { details }
            | Self::Persistence { details } => Some(details.as_str()),
            Self::AuthorizationRequired => Some("no active oauth flow found for the state key"),
            Self::MissingCredential | Self::AccessDenied => None,
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details() {
            Some(details) => write!(f, "{}: {}", self.message(), details),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for FlowError {}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.to_string();

        match &self {
            // Expected client conditions carry no detail worth an error log.
            Self::MissingCredential | Self::AccessDenied | Self::UnknownProvider { .. } => {
                tracing::debug!(status = status.as_u16(), "{}", body);
            }
            _ => {
                tracing::error!(status = status.as_u16(), error = %body, "{}", self.message());
            }
        }

        (status, body).into_response()
    }
}
