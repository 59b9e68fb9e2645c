use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use p256::ecdsa::{Signature, SigningKey, signature::Signer as _};
use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use rand_core::OsRng;

use crate::crypto::signer::{HasPublicKey, JwsSigningKey};
use crate::jwk::{self, PublicJwk};

const ALGORITHM: &str = "ES256";

struct Es256PrivateKeyInner {
    signing_key: SigningKey,
    jwk: PublicJwk,
}

/// An ES256 (P-256) private key.
///
/// Cloning shares the key; it is never serialized.
#[derive(Clone)]
pub struct Es256PrivateKey {
    inner: Arc<Es256PrivateKeyInner>,
}

impl fmt::Debug for Es256PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Es256PrivateKey")
            .field("jwk", &self.inner.jwk)
            .finish_non_exhaustive()
    }
}

impl From<SigningKey> for Es256PrivateKey {
    fn from(value: SigningKey) -> Self {
        let encoded_point = value.verifying_key().to_encoded_point(false);
        let key = jwk::EcPublicKey::builder()
            .crv("P-256")
            .x(encoded_point
                .x()
                .expect("uncompressed point always has x coordinate")
                .to_vec())
            .y(encoded_point
                .y()
                .expect("uncompressed point always has y coordinate")
                .to_vec())
            .build();

        Self {
            inner: Arc::new(Es256PrivateKeyInner {
                signing_key: value,
                jwk: PublicJwk::builder()
                    .algorithm(ALGORITHM)
                    .key_use(jwk::KeyUse::Sign)
                    .key(key)
                    .build(),
            }),
        }
    }
}

impl Es256PrivateKey {
    /// Generates a fresh ES256 private key in memory.
    #[must_use]
    pub fn generate() -> Self {
        SigningKey::random(&mut OsRng).into()
    }
}

impl JwsSigningKey for Es256PrivateKey {
    type Error = Infallible;

    fn jws_algorithm(&self) -> &str {
        ALGORITHM
    }

    async fn sign(&self, input: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let signature: Signature = self.inner.signing_key.sign(input);
        Ok(signature.to_bytes().to_vec())
    }
}

impl HasPublicKey for Es256PrivateKey {
    fn public_key_jwk(&self) -> &PublicJwk {
        &self.inner.jwk
    }
}
