//! Signing key traits.

use crate::jwk::PublicJwk;
use crate::platform::{MaybeSend, MaybeSendSync};

/// A key that produces JWS signatures (RFC 7515) for one JWA algorithm.
///
/// Signing is asynchronous so that the private key may live outside the
/// process, for example in a KMS or a hardware token.
pub trait JwsSigningKey: MaybeSendSync {
    /// The error type returned by this signer's operations.
    type Error: crate::Error + 'static;

    /// The JWS algorithm identifier, used as the `alg` header.
    fn jws_algorithm(&self) -> &str;

    /// Signs `input` and returns the raw JWS signature bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing operation fails.
    fn sign(&self, input: &[u8]) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + MaybeSend;
}

/// A key pair whose public half can be published as a JWK.
pub trait HasPublicKey: MaybeSendSync {
    /// The public key, embedded in the `jwk` header of every proof.
    fn public_key_jwk(&self) -> &PublicJwk;

    /// The RFC 7638 thumbprint of the public key.
    ///
    /// Providers record it as the `jkt` confirmation of a bound token.
    fn jwk_thumbprint(&self) -> Option<String> {
        self.public_key_jwk().thumbprint()
    }
}
