use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{platform::SystemTime, token::AccessToken};

/// The response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: AccessToken,
    /// The token type; `DPoP` for a key-bound token.
    pub token_type: Option<String>,
    /// Number of seconds until token expiry.
    pub expires_in: Option<u64>,
    /// The granted scopes.
    pub scope: Option<String>,
    /// A synthetic field which is set to the received time.
    #[serde(skip, default = "SystemTime::now")]
    pub received_at: SystemTime,
    /// Other fields received from the token endpoint.
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl TokenResponse {
    /// Gets a value from the "extra" token fields.
    #[must_use]
    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
