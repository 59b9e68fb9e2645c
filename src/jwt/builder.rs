use std::{borrow::Cow, time::Duration};

use base64::prelude::*;
use bon::Builder;
use secrecy::SecretString;
use serde::Serialize;
use snafu::prelude::*;

use crate::{crypto::signer::JwsSigningKey, platform::SystemTime};

/// A JWT ready to be signed.
///
/// The signing key contributes the `alg` header; everything else is carried
/// here. `jti` defaults to a fresh UUID v7 so two tokens built in the same
/// second still differ.
#[derive(Debug, Clone, Builder)]
pub struct Jwt<'a, ExtraHeaders: Serialize, ExtraClaims: Serialize> {
    /// The `typ` header.
    #[builder(default = "JWT", into)]
    pub typ: Cow<'a, str>,
    /// The `iat` claim, in seconds since the epoch.
    pub issued_at: Option<u64>,
    /// The `exp` claim, in seconds since the epoch.
    pub expiration: Option<u64>,
    /// The `jti` claim.
    #[builder(into, default = uuid::Uuid::now_v7().to_string())]
    pub jti: String,
    /// Members merged into the header.
    pub extra_headers: Option<ExtraHeaders>,
    /// Members merged into the claims.
    pub extra_claims: Option<ExtraClaims>,
}

#[derive(Serialize)]
struct Header<'a, Extra> {
    alg: &'a str,
    typ: &'a str,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    extra: Option<&'a Extra>,
}

#[derive(Serialize)]
struct Claims<'a, Extra> {
    #[serde(skip_serializing_if = "Option::is_none")]
    iat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<u64>,
    jti: &'a str,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    extra: Option<&'a Extra>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl<'a, ExtraHeaders: Serialize, ExtraClaims: Serialize, S: jwt_builder::State>
    JwtBuilder<'a, ExtraHeaders, ExtraClaims, S>
{
    /// Sets the issued-at time to now, and the expiry to now plus `lifetime`.
    pub fn issued_now_expires_after(
        self,
        lifetime: Duration,
    ) -> JwtBuilder<
        'a,
        ExtraHeaders,
        ExtraClaims,
        jwt_builder::SetExpiration<jwt_builder::SetIssuedAt<S>>,
    >
    where
        S::IssuedAt: jwt_builder::IsUnset,
        S::Expiration: jwt_builder::IsUnset,
    {
        let now = unix_now();
        self.issued_at(now)
            .expiration(now.saturating_add(lifetime.as_secs()))
    }
}

/// Errors that occur when attempting to serialize the JWT.
#[derive(Debug, Snafu)]
pub enum JwsSerializationError<SgnErr: crate::Error + 'static> {
    /// The header or claims could not be converted to JSON.
    #[snafu(display("Failed to encode JWT {segment} as JSON"))]
    Encode {
        /// Which segment failed, `header` or `claims`.
        segment: &'static str,
        /// The underlying error from `serde_json`.
        source: serde_json::Error,
    },
    /// Failed to sign the JWT.
    #[snafu(display("Failed to sign JWT"))]
    Sign {
        /// The underlying signing error.
        source: SgnErr,
    },
}

impl<SgnErr: crate::Error> crate::Error for JwsSerializationError<SgnErr> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Encode { .. } => false,
            Self::Sign { source } => source.is_retryable(),
        }
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_vec(value).map(|json| BASE64_URL_SAFE_NO_PAD.encode(json))
}

impl<ExtraHeaders: Serialize, ExtraClaims: Serialize> Jwt<'_, ExtraHeaders, ExtraClaims> {
    /// Signs the JWT and returns its JWS compact serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWT could not be serialized to JSON, or signing failed.
    pub async fn to_jws_compact<Sgn: JwsSigningKey>(
        &self,
        signer: &Sgn,
    ) -> Result<SecretString, JwsSerializationError<Sgn::Error>> {
        let header = Header {
            alg: signer.jws_algorithm(),
            typ: &self.typ,
            extra: self.extra_headers.as_ref(),
        };
        let claims = Claims {
            iat: self.issued_at,
            exp: self.expiration,
            jti: &self.jti,
            extra: self.extra_claims.as_ref(),
        };

        let mut compact = encode_segment(&header).context(EncodeSnafu { segment: "header" })?;
        compact.push('.');
        compact.push_str(&encode_segment(&claims).context(EncodeSnafu { segment: "claims" })?);

        let signature = signer
            .sign(compact.as_bytes())
            .await
            .context(SignSnafu)?;
        compact.push('.');
        compact.push_str(&BASE64_URL_SAFE_NO_PAD.encode(signature));

        Ok(compact.into())
    }
}
