use std::convert::Infallible;

use snafu::prelude::*;

use crate::{
    client_auth::ClientSecret,
    credentials::ClientCredentials,
    crypto::signer::{Es256PrivateKey, HasPublicKey, JwsSigningKey},
    dpop::DPoP,
    grant::{ClientCredentialsGrant, ClientCredentialsGrantError, TokenResponse},
    http::{HttpClient, HttpResponse},
    platform::{Duration, SystemTime},
    provider::{ProviderUrl, ProviderUrlError, TOKEN_PATH},
    token::AccessToken,
};

/// The scope requested for Solid access tokens.
const WEBID_SCOPE: &str = "webid";

/// An access token together with the key pair it is bound to.
///
/// Only the token acquisition produces this pairing, so a token can never
/// be presented with proofs from a different key.
#[derive(Debug, Clone)]
pub struct DPoPBoundToken<Sgn: JwsSigningKey + HasPublicKey = Es256PrivateKey> {
    access_token: AccessToken,
    dpop: DPoP<Sgn>,
    expires_in: Option<u64>,
    received_at: SystemTime,
}

impl<Sgn: JwsSigningKey + HasPublicKey> DPoPBoundToken<Sgn> {
    pub(crate) fn new(response: TokenResponse, dpop: DPoP<Sgn>) -> Self {
        Self {
            access_token: response.access_token,
            dpop,
            expires_in: response.expires_in,
            received_at: response.received_at,
        }
    }

    /// The access token.
    #[must_use]
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// The `DPoP` signer the token is bound to.
    #[must_use]
    pub fn dpop(&self) -> &DPoP<Sgn> {
        &self.dpop
    }

    /// Seconds the token was valid for when issued, if reported.
    #[must_use]
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// When the token was received.
    #[must_use]
    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    /// Returns `true` if the token expires within `margin`.
    ///
    /// A token issued without `expires_in` never reports as expired.
    #[must_use]
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            SystemTime::now() + margin >= self.received_at + Duration::from_secs(expires_in)
        })
    }
}

/// Requests a `DPoP`-bound access token with client credentials.
///
/// A new ES256 key pair is generated for every call.
///
/// # Errors
///
/// Returns an error if the token endpoint cannot be resolved, or the token
/// request fails.
#[tracing::instrument(
    name = "acquire_access_token",
    skip_all,
    fields(issuer = %provider, client_id = %credentials.id)
)]
pub async fn acquire_access_token<C: HttpClient>(
    http_client: &C,
    provider: &ProviderUrl,
    credentials: &ClientCredentials,
) -> Result<DPoPBoundToken, TokenAcquisitionError<C::Error, <C::Response as HttpResponse>::Error>>
{
    let token_endpoint = provider.resolve(TOKEN_PATH).context(ProviderSnafu)?;

    let grant = ClientCredentialsGrant::builder()
        .client_auth(ClientSecret::new(
            credentials.id.as_str(),
            credentials.secret.clone(),
        ))
        .dpop(DPoP::generate())
        .token_endpoint_url(token_endpoint)
        .scopes([WEBID_SCOPE])
        .build();

    let token = grant
        .request_bound_token(http_client)
        .await
        .context(GrantSnafu)?;
    tracing::debug!(expires_in = token.expires_in(), "access token issued");

    Ok(token)
}

/// Errors from [`acquire_access_token`].
#[derive(Debug, Snafu)]
pub enum TokenAcquisitionError<HttpReqErr: crate::Error + 'static, HttpRespErr: crate::Error + 'static>
{
    /// The token endpoint could not be resolved against the provider URL.
    #[snafu(display("Failed to resolve token endpoint"))]
    Provider {
        /// The underlying error.
        source: ProviderUrlError,
    },
    /// The client credentials grant failed.
    #[snafu(display("Failed to obtain access token"))]
    Grant {
        /// The underlying error.
        source: ClientCredentialsGrantError<HttpReqErr, HttpRespErr, Infallible>,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for TokenAcquisitionError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { source } => source.is_retryable(),
            Self::Grant { source } => source.is_retryable(),
        }
    }
}
