use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// An `OAuth2` access token issued with `token_type: DPoP`.
///
/// The token is only usable together with the key pair it was bound to.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Returns the raw token for placing in an `Authorization` header.
    #[must_use]
    pub fn expose_token(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<SecretString> for AccessToken {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}

impl ExposeSecret<str> for AccessToken {
    fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl<'de> Deserialize<'de> for AccessToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token: AccessToken = serde_json::from_str(r#""eyJhbGciOiJFUzI1NiJ9.e30.sig""#).unwrap();

        assert_eq!(token.expose_token(), "eyJhbGciOiJFUzI1NiJ9.e30.sig");
        assert!(!format!("{token:?}").contains("eyJhbGci"));
    }
}
