//! HMAC-signed state codec.

use crate::error::StateError;
use crate::state::AnonymousState;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use token_bridge_core::Result;

/// Signs and verifies state payloads as compact HS256 JWTs.
///
/// The same codec (same secret) must be used when issuing a state and when
/// verifying it at the callback. Anything not signed with that secret,
/// including unsigned `alg: none` tokens, is rejected.
#[derive(Clone)]
pub struct StateCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl StateCodec {
    /// Creates a codec from the shared signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::EmptySecret`] if `secret` is empty.
    pub fn new(secret: &[u8]) -> Result<Self, StateError> {
        if secret.is_empty() {
            return Err(StateError::EmptySecret.into());
        }

        // State payloads are plain JSON objects without registered claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Signs a payload.
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, StateError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), payload, &self.encoding).map_err(|e| {
            StateError::EncodingFailed {
                details: e.to_string(),
            }
            .into()
        })
    }

    /// Verifies and decodes an [`AnonymousState`].
    pub fn parse_anonymous(&self, signed: &str) -> Result<AnonymousState, StateError> {
        self.parse_into(signed)
    }

    /// Verifies a signed string and decodes it into any payload type.
    pub fn parse_into<T: DeserializeOwned>(&self, signed: &str) -> Result<T, StateError> {
        if signed.is_empty() {
            return Err(StateError::Invalid {
                details: "state is empty".to_string(),
            }
            .into());
        }

        jsonwebtoken::decode::<T>(signed, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                StateError::Invalid {
                    details: e.to_string(),
                }
                .into()
            })
    }
}

impl fmt::Debug for StateCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCodec").finish_non_exhaustive()
    }
}
