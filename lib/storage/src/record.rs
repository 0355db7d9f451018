//! The persisted token shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A provider token normalized for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub token_type: String,
    /// Empty when the provider issued none.
    pub refresh_token: String,
    /// Expiry in seconds since the Unix epoch; `0` when unknown.
    pub expiry: u64,
}

impl TokenRecord {
    /// Flattens the record into string key/value pairs.
    #[must_use]
    pub fn to_string_data(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("access_token".to_string(), self.access_token.clone()),
            ("token_type".to_string(), self.token_type.clone()),
            ("refresh_token".to_string(), self.refresh_token.clone()),
            ("expiry".to_string(), self.expiry.to_string()),
        ])
    }
}
