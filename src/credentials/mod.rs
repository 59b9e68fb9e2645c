//! Exchanging account login details for client credentials.
//!
//! The provider mints a client identifier and secret that can then be used
//! with the client credentials grant. How they are minted depends on the
//! [`ProviderDialect`](crate::provider::ProviderDialect).

mod account_api;
mod direct;

use http::header::InvalidHeaderValue;
use secrecy::SecretString;
use serde::Deserialize;
use snafu::prelude::*;

use crate::{
    account::{MissingControlError, WebIdSelectionError},
    config::ResolvedFetchConfig,
    http::{HttpClient, HttpResponse, SendError},
    provider::{ProviderDialect, ProviderUrlError},
};

/// Client credentials minted by the provider.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    /// The client identifier.
    pub id: String,
    /// The client secret.
    pub secret: SecretString,
    /// Where the provider lists the credential, for later removal.
    pub resource: Option<String>,
}

impl ClientCredentials {
    /// Creates credentials that were provisioned ahead of time.
    pub fn new(id: impl Into<String>, secret: impl Into<SecretString>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            resource: None,
        }
    }
}

#[derive(Deserialize)]
struct MintedCredentials {
    id: String,
    secret: String,
    resource: Option<String>,
}

impl From<MintedCredentials> for ClientCredentials {
    fn from(value: MintedCredentials) -> Self {
        Self {
            id: value.id,
            secret: value.secret.into(),
            resource: value.resource,
        }
    }
}

/// Mints client credentials for the configured account.
///
/// # Errors
///
/// Returns an error if a provider request fails, a required control is
/// missing, or no WebID can be chosen.
#[tracing::instrument(
    name = "exchange_credentials",
    skip_all,
    fields(issuer = %config.issuer, dialect = ?config.dialect)
)]
pub async fn exchange<C: HttpClient>(
    http_client: &C,
    config: &ResolvedFetchConfig,
) -> Result<
    ClientCredentials,
    CredentialExchangeError<C::Error, <C::Response as HttpResponse>::Error>,
> {
    let credentials = match config.dialect {
        ProviderDialect::Direct => direct::exchange(http_client, config).await?,
        ProviderDialect::AccountApi => account_api::exchange(http_client, config).await?,
    };
    tracing::debug!(client_id = %credentials.id, "client credentials minted");
    Ok(credentials)
}

/// Errors from [`exchange`].
#[derive(Debug, Snafu)]
pub enum CredentialExchangeError<
    HttpReqErr: crate::Error + 'static,
    HttpRespErr: crate::Error + 'static,
> {
    /// An endpoint could not be resolved against the issuer URL.
    #[snafu(display("Failed to resolve credentials endpoint"))]
    Provider {
        /// The underlying error.
        source: ProviderUrlError,
    },
    /// The account control document could not be fetched.
    #[snafu(display("Failed to fetch account controls"))]
    Controls {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
    /// A required control was not offered.
    #[snafu(display("Account controls are incomplete"))]
    MissingControl {
        /// The underlying error.
        source: MissingControlError,
    },
    /// The password login was rejected.
    #[snafu(display("Failed to log in"))]
    Login {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
    /// The login returned an authorization value that cannot be sent back.
    #[snafu(display("Login returned an unusable authorization value"))]
    InvalidAuthorization {
        /// The underlying error.
        source: InvalidHeaderValue,
    },
    /// The linked WebIDs could not be listed.
    #[snafu(display("Failed to list linked WebIDs"))]
    ListWebIds {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
    /// No WebID could be chosen.
    #[snafu(display("Failed to choose a WebID"))]
    WebId {
        /// The underlying error.
        source: WebIdSelectionError,
    },
    /// The provider refused to mint the credentials.
    #[snafu(display("Failed to mint client credentials"))]
    Mint {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error>
    CredentialExchangeError<HttpReqErr, HttpRespErr>
{
    /// Returns the failed provider request, if the provider rejected a step.
    #[must_use]
    pub fn send_error(&self) -> Option<&SendError<HttpReqErr, HttpRespErr>> {
        match self {
            Self::Controls { source }
            | Self::Login { source }
            | Self::ListWebIds { source }
            | Self::Mint { source } => Some(source),
            Self::Provider { .. }
            | Self::MissingControl { .. }
            | Self::InvalidAuthorization { .. }
            | Self::WebId { .. } => None,
        }
    }
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for CredentialExchangeError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        self.send_error().is_some_and(crate::Error::is_retryable)
    }
}
