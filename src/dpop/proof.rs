use std::time::Duration;

use base64::prelude::*;
use http::{Method, Uri};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use snafu::prelude::*;

use crate::{
    crypto::signer::{Es256PrivateKey, HasPublicKey, JwsSigningKey},
    jwt::{JwsSerializationError, Jwt},
    token::AccessToken,
};

/// How long a proof remains acceptable after it was issued.
const PROOF_LIFETIME: Duration = Duration::from_secs(60);

/// Signs `DPoP` proofs with one key pair.
#[derive(Debug, Clone)]
pub struct DPoP<Sgn: JwsSigningKey + HasPublicKey = Es256PrivateKey> {
    signer: Sgn,
    jwk_thumbprint: Option<String>,
}

impl DPoP<Es256PrivateKey> {
    /// Creates a `DPoP` signer around a freshly generated ES256 key pair.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Es256PrivateKey::generate())
    }
}

impl<Sgn: JwsSigningKey + HasPublicKey> DPoP<Sgn> {
    /// Creates a `DPoP` signer around an existing key pair.
    pub fn new(signer: Sgn) -> Self {
        let jwk_thumbprint = signer.jwk_thumbprint();
        Self {
            signer,
            jwk_thumbprint,
        }
    }

    /// Returns the JWK thumbprint (`jkt`) of the public key.
    #[must_use]
    pub fn jwk_thumbprint(&self) -> Option<&str> {
        self.jwk_thumbprint.as_deref()
    }

    /// Returns the signing key.
    pub fn signer(&self) -> &Sgn {
        &self.signer
    }

    /// Creates a proof for one request.
    ///
    /// `htu` is the request URI without query or fragment. Every call yields
    /// a new `jti`, so repeated requests to the same URL never share a proof.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI has no scheme or authority, or signing fails.
    pub async fn proof(
        &self,
        method: &Method,
        uri: &Uri,
        access_token: Option<&AccessToken>,
    ) -> Result<SecretString, DPoPProofError<Sgn::Error>> {
        #[derive(Debug, Clone, Serialize)]
        struct DPoPHeaders {
            jwk: serde_json::Value,
        }

        #[derive(Debug, Clone, Serialize)]
        struct DPoPClaims<'a> {
            htm: &'a str,
            htu: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            ath: Option<String>,
        }

        let htu = normalize_uri_for_dpop::<Sgn::Error>(uri)?;

        let extra_headers = DPoPHeaders {
            jwk: serde_json::to_value(self.signer.public_key_jwk()).context(EncodeJwkSnafu)?,
        };

        let extra_claims = DPoPClaims {
            htm: method.as_str(),
            htu: htu.to_string(),
            ath: access_token.map(hash_access_token_for_dpop),
        };

        let jwt = Jwt::builder()
            .typ("dpop+jwt")
            .issued_now_expires_after(PROOF_LIFETIME)
            .extra_headers(extra_headers)
            .extra_claims(extra_claims)
            .build();

        jwt.to_jws_compact(&self.signer).await.context(SerializeSnafu)
    }
}

/// Errors that may occur when creating a proof.
#[derive(Debug, Snafu)]
pub enum DPoPProofError<SgnErr: crate::Error + 'static> {
    /// The request URI lacks a scheme or authority.
    #[snafu(display("Request URI '{uri}' is not absolute"))]
    RelativeUri {
        /// The rejected URI.
        uri: String,
    },
    /// The request URI cannot be expressed as an `htu` claim.
    #[snafu(display("Request URI cannot be used as a DPoP htu claim"))]
    Normalize {
        /// The underlying error.
        source: http::Error,
    },
    /// The public key could not be embedded in the proof header.
    #[snafu(display("Failed to encode public JWK"))]
    EncodeJwk {
        /// The underlying error.
        source: serde_json::Error,
    },
    /// The proof could not be serialized or signed.
    #[snafu(display("Failed to sign DPoP proof"))]
    Serialize {
        /// The underlying error.
        source: JwsSerializationError<SgnErr>,
    },
}

impl<SgnErr: crate::Error> crate::Error for DPoPProofError<SgnErr> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RelativeUri { .. } | Self::Normalize { .. } | Self::EncodeJwk { .. } => false,
            Self::Serialize { source } => source.is_retryable(),
        }
    }
}

fn normalize_uri_for_dpop<E: crate::Error>(uri: &Uri) -> Result<Uri, DPoPProofError<E>> {
    let (Some(scheme), Some(authority)) = (uri.scheme(), uri.authority()) else {
        return RelativeUriSnafu {
            uri: uri.to_string(),
        }
        .fail();
    };

    Uri::builder()
        .scheme(scheme.clone())
        .authority(authority.clone())
        .path_and_query(uri.path())
        .build()
        .context(NormalizeSnafu)
}

fn hash_access_token_for_dpop(access_token: &AccessToken) -> String {
    let mut hasher = Sha256::new();
    hasher.update(access_token.expose_secret().as_bytes());
    BASE64_URL_SAFE_NO_PAD.encode(hasher.finalize())
}
