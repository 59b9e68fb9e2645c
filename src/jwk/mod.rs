//! Public JSON Web Keys (RFC 7517/7518) as embedded in `DPoP` proofs.
//!
//! A proof carries the public half of the session key pair in its `jwk`
//! header. Only elliptic curve keys are modelled since proofs are signed with
//! ES256.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use bon::Builder;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// A public JSON Web Key (RFC 7517 §4).
#[derive(Debug, Serialize, Deserialize, Builder, PartialEq, Clone)]
pub struct PublicJwk {
    /// The key details.
    #[builder(into)]
    #[serde(flatten)]
    pub key: PublicKey,
    /// The key use for this key.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUse>,
    /// The algorithm of this key.
    #[builder(into)]
    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl PublicJwk {
    /// Computes the JWK SHA-256 thumbprint (RFC 7638), base64url encoded.
    ///
    /// This is the `jkt` value a provider binds a `DPoP` access token to.
    #[must_use]
    pub fn thumbprint(&self) -> Option<String> {
        let canonical = match &self.key {
            PublicKey::Ec(ec_public_key) => ec_public_key.canonical_form(),
            PublicKey::Unknown => return None,
        };

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Some(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }
}

/// Key use parameter (RFC 7517 §4.2).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub enum KeyUse {
    /// Digital signature or MAC.
    #[serde(rename = "sig")]
    Sign,
    /// Encryption.
    #[serde(rename = "enc")]
    Encrypt,
}

/// The key type specific members of a JWK.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "kty")]
pub enum PublicKey {
    /// An Elliptic Curve public key.
    #[serde(rename = "EC")]
    Ec(EcPublicKey),
    /// Any other key type.
    #[serde(skip, other)]
    Unknown,
}

/// An Elliptic Curve public key (RFC 7518 §6.2).
#[derive(Debug, Serialize, Deserialize, Builder, PartialEq, Clone)]
pub struct EcPublicKey {
    /// The curve name.
    #[builder(into)]
    pub crv: String,
    /// The x coordinate.
    #[builder(with = <_>::from_iter)]
    #[serde(with = "base64url")]
    pub x: Vec<u8>,
    /// The y coordinate.
    #[builder(with = <_>::from_iter)]
    #[serde(with = "base64url")]
    pub y: Vec<u8>,
}

impl EcPublicKey {
    fn canonical_form(&self) -> String {
        let crv = &self.crv;
        let x = URL_SAFE_NO_PAD.encode(&self.x);
        let y = URL_SAFE_NO_PAD.encode(&self.y);

        format!(r#"{{"crv":"{crv}","kty":"EC","x":"{x}","y":"{y}"}}"#)
    }
}

impl From<EcPublicKey> for PublicKey {
    fn from(value: EcPublicKey) -> Self {
        Self::Ec(value)
    }
}

mod base64url {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        URL_SAFE_NO_PAD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // EC key from https://www.rfc-editor.org/rfc/rfc7517.html#appendix-A.1
    const X: &str = "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4";
    const Y: &str = "4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM";

    fn appendix_key() -> PublicJwk {
        PublicJwk::builder()
            .key(
                EcPublicKey::builder()
                    .crv("P-256")
                    .x(URL_SAFE_NO_PAD.decode(X).unwrap())
                    .y(URL_SAFE_NO_PAD.decode(Y).unwrap())
                    .build(),
            )
            .key_use(KeyUse::Sign)
            .algorithm("ES256")
            .build()
    }

    #[test]
    fn test_serializes_as_flat_jwk() {
        let value = serde_json::to_value(appendix_key()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "kty": "EC",
                "crv": "P-256",
                "x": X,
                "y": Y,
                "use": "sig",
                "alg": "ES256",
            })
        );
    }

    #[test]
    fn test_thumbprint_ignores_optional_members() {
        let with_members = appendix_key();
        let mut bare = with_members.clone();
        bare.key_use = None;
        bare.algorithm = None;

        let thumbprint = with_members.thumbprint().unwrap();
        assert_eq!(Some(thumbprint.clone()), bare.thumbprint());
        assert_eq!(thumbprint.len(), 43);
    }
}
