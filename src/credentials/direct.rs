use secrecy::ExposeSecret as _;
use serde::Serialize;
use snafu::prelude::*;

use crate::{
    config::ResolvedFetchConfig,
    credentials::{
        ClientCredentials, CredentialExchangeError, MintSnafu, MintedCredentials, ProviderSnafu,
    },
    http::{HttpClient, HttpResponse, ProviderRequest},
    provider::DIRECT_CREDENTIALS_PATH,
};

/// Mints credentials with a single request carrying the account login.
pub(super) async fn exchange<C: HttpClient>(
    http_client: &C,
    config: &ResolvedFetchConfig,
) -> Result<
    ClientCredentials,
    CredentialExchangeError<C::Error, <C::Response as HttpResponse>::Error>,
> {
    #[derive(Serialize)]
    struct CredentialsRequest<'a> {
        email: &'a str,
        password: &'a str,
        name: &'a str,
    }

    let url = config
        .issuer
        .resolve(DIRECT_CREDENTIALS_PATH)
        .context(ProviderSnafu)?;
    tracing::debug!(%url, "requesting client credentials");

    let minted: MintedCredentials = ProviderRequest::post(url.as_uri())
        .json(&CredentialsRequest {
            email: &config.email,
            password: config.password.expose_secret(),
            name: &config.token_name,
        })
        .send_json(http_client)
        .await
        .context(MintSnafu)?;

    Ok(minted.into())
}
