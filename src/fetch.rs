//! The authenticated transport.
//!
//! [`get_authenticated_fetch`] turns account login details into an
//! [`AuthenticatedClient`]: a transport that signs a fresh `DPoP` proof for
//! every request and presents the bound access token alongside it.

use std::sync::Arc;

use bytes::Bytes;
use http::{
    HeaderValue, Request,
    header::{AUTHORIZATION, InvalidHeaderValue},
};
use secrecy::ExposeSecret as _;
use snafu::prelude::*;

use crate::{
    config::{ConfigError, FetchConfig},
    credentials::{self, ClientCredentials, CredentialExchangeError},
    crypto::signer::{Es256PrivateKey, HasPublicKey, JwsSigningKey},
    dpop::{DPOP_HEADER, DPoPProofError},
    grant::{DPoPBoundToken, TokenAcquisitionError, acquire_access_token},
    http::{HttpClient, HttpResponse},
    provider::ProviderUrl,
};

/// A transport that authenticates every request with a `DPoP`-bound token.
///
/// Each request gets its own proof for its method and URL; the response of
/// the inner transport is returned as is, including error statuses.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient<C, Sgn: JwsSigningKey + HasPublicKey = Es256PrivateKey> {
    inner: C,
    token: Arc<DPoPBoundToken<Sgn>>,
}

impl<C, Sgn: JwsSigningKey + HasPublicKey> AuthenticatedClient<C, Sgn> {
    /// Wraps a transport with a bound token.
    pub fn new(inner: C, token: DPoPBoundToken<Sgn>) -> Self {
        Self {
            inner,
            token: Arc::new(token),
        }
    }

    /// The bound token in use.
    #[must_use]
    pub fn token(&self) -> &DPoPBoundToken<Sgn> {
        &self.token
    }

    /// The wrapped transport.
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: HttpClient, Sgn: JwsSigningKey + HasPublicKey> HttpClient for AuthenticatedClient<C, Sgn> {
    type Error = AuthenticatedRequestError<C::Error, Sgn::Error>;
    type Response = C::Response;

    async fn execute(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        let (mut parts, body) = request.into_parts();

        let access_token = self.token.access_token();
        let proof = self
            .token
            .dpop()
            .proof(&parts.method, &parts.uri, Some(access_token))
            .await
            .context(ProofSnafu)?;

        let mut authorization =
            HeaderValue::from_str(&format!("DPoP {}", access_token.expose_token()))
                .context(BadHeaderSnafu)?;
        authorization.set_sensitive(true);
        let proof = HeaderValue::from_str(proof.expose_secret()).context(BadHeaderSnafu)?;

        parts.headers.insert(AUTHORIZATION, authorization);
        parts.headers.insert(DPOP_HEADER, proof);

        tracing::trace!(method = %parts.method, uri = %parts.uri, "sending authenticated request");
        self.inner
            .execute(Request::from_parts(parts, body))
            .await
            .context(RequestSnafu)
    }
}

/// Errors from [`AuthenticatedClient`] requests.
#[derive(Debug, Snafu)]
pub enum AuthenticatedRequestError<HttpReqErr: crate::Error + 'static, SgnErr: crate::Error + 'static>
{
    /// The proof for the request could not be created.
    #[snafu(display("Failed to create DPoP proof for request"))]
    Proof {
        /// The underlying error.
        source: DPoPProofError<SgnErr>,
    },
    /// The token or proof is not a valid header value.
    #[snafu(display("Authentication header value was invalid"))]
    BadHeader {
        /// The underlying error.
        source: InvalidHeaderValue,
    },
    /// The inner transport failed.
    #[snafu(display("Failed to make HTTP request"))]
    Request {
        /// The underlying error.
        source: HttpReqErr,
    },
}

impl<HttpReqErr: crate::Error, SgnErr: crate::Error> crate::Error
    for AuthenticatedRequestError<HttpReqErr, SgnErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Proof { source } => source.is_retryable(),
            Self::BadHeader { .. } => false,
            Self::Request { source } => source.is_retryable(),
        }
    }
}

/// Logs in, mints client credentials, and returns an authenticated transport.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the credentials
/// cannot be minted, or no access token is issued.
#[tracing::instrument(name = "get_authenticated_fetch", skip_all)]
pub async fn get_authenticated_fetch<C: HttpClient>(
    config: &FetchConfig,
    http_client: C,
) -> Result<AuthenticatedClient<C>, GetAuthenticatedFetchError<C::Error, <C::Response as HttpResponse>::Error>>
{
    let config = config.resolve().context(ConfigSnafu)?;
    let credentials = credentials::exchange(&http_client, &config)
        .await
        .context(CredentialsSnafu)?;

    get_authenticated_fetch_with_credentials(&config.issuer, &credentials, http_client).await
}

/// Returns an authenticated transport for pre-provisioned client credentials.
///
/// # Errors
///
/// Returns an error if no access token is issued.
pub async fn get_authenticated_fetch_with_credentials<C: HttpClient>(
    provider: &ProviderUrl,
    credentials: &ClientCredentials,
    http_client: C,
) -> Result<AuthenticatedClient<C>, GetAuthenticatedFetchError<C::Error, <C::Response as HttpResponse>::Error>>
{
    let token = acquire_access_token(&http_client, provider, credentials)
        .await
        .context(TokenSnafu)?;
    tracing::debug!(jkt = token.dpop().jwk_thumbprint(), "authenticated transport ready");

    Ok(AuthenticatedClient::new(http_client, token))
}

/// Errors from [`get_authenticated_fetch`].
#[derive(Debug, Snafu)]
pub enum GetAuthenticatedFetchError<
    HttpReqErr: crate::Error + 'static,
    HttpRespErr: crate::Error + 'static,
> {
    /// The configuration could not be resolved.
    #[snafu(display("Invalid configuration"))]
    Config {
        /// The underlying error.
        source: ConfigError,
    },
    /// Client credentials could not be minted.
    #[snafu(display("Failed to obtain client credentials"))]
    Credentials {
        /// The underlying error.
        source: CredentialExchangeError<HttpReqErr, HttpRespErr>,
    },
    /// No access token was issued.
    #[snafu(display("Failed to obtain access token"))]
    Token {
        /// The underlying error.
        source: TokenAcquisitionError<HttpReqErr, HttpRespErr>,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for GetAuthenticatedFetchError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Config { source } => source.is_retryable(),
            Self::Credentials { source } => source.is_retryable(),
            Self::Token { source } => source.is_retryable(),
        }
    }
}
