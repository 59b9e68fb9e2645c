use http::{HeaderValue, header::AUTHORIZATION};
use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    account::{AccountControls, WebIdLinks, require},
    config::ResolvedFetchConfig,
    credentials::{
        ClientCredentials, ControlsSnafu, CredentialExchangeError, InvalidAuthorizationSnafu,
        ListWebIdsSnafu, LoginSnafu, MintSnafu, MintedCredentials, MissingControlSnafu,
        ProviderSnafu, WebIdSnafu,
    },
    http::{HttpClient, HttpResponse, ProviderRequest},
    provider::ACCOUNT_INDEX_PATH,
};

/// Scheme of the `Authorization` header for account API sessions.
const ACCOUNT_TOKEN_SCHEME: &str = "CSS-Account-Token";

/// Logs in to the account API and mints credentials through its controls.
pub(super) async fn exchange<C: HttpClient>(
    http_client: &C,
    config: &ResolvedFetchConfig,
) -> Result<
    ClientCredentials,
    CredentialExchangeError<C::Error, <C::Response as HttpResponse>::Error>,
> {
    #[derive(Serialize)]
    struct LoginRequest<'a> {
        email: &'a str,
        password: &'a str,
    }

    #[derive(Deserialize)]
    struct LoginResponse {
        authorization: String,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct MintRequest<'a> {
        name: &'a str,
        web_id: &'a str,
    }

    let index_url = config
        .issuer
        .resolve(ACCOUNT_INDEX_PATH)
        .context(ProviderSnafu)?;
    tracing::debug!(url = %index_url, "fetching account controls");
    let anonymous: AccountControls = ProviderRequest::get(index_url.as_uri())
        .send_json(http_client)
        .await
        .context(ControlsSnafu)?;
    let login_url = require(anonymous.controls.password.login.as_ref(), "password.login")
        .context(MissingControlSnafu)?;

    tracing::debug!(url = %login_url, "logging in");
    let login: LoginResponse = ProviderRequest::post(login_url.as_uri())
        .json(&LoginRequest {
            email: &config.email,
            password: config.password.expose_secret(),
        })
        .send_json(http_client)
        .await
        .context(LoginSnafu)?;
    let mut authorization =
        HeaderValue::from_str(&format!("{ACCOUNT_TOKEN_SCHEME} {}", login.authorization))
            .context(InvalidAuthorizationSnafu)?;
    authorization.set_sensitive(true);

    tracing::debug!(url = %index_url, "fetching account controls for session");
    let session: AccountControls = ProviderRequest::get(index_url.as_uri())
        .header(AUTHORIZATION, authorization.clone())
        .send_json(http_client)
        .await
        .context(ControlsSnafu)?;
    let account = &session.controls.account;
    let credentials_url = require(account.client_credentials.as_ref(), "account.clientCredentials")
        .context(MissingControlSnafu)?;
    let web_id_url =
        require(account.web_id.as_ref(), "account.webId").context(MissingControlSnafu)?;

    tracing::debug!(url = %web_id_url, "listing linked WebIDs");
    let links: WebIdLinks = ProviderRequest::get(web_id_url.as_uri())
        .header(AUTHORIZATION, authorization.clone())
        .send_json(http_client)
        .await
        .context(ListWebIdsSnafu)?;
    let web_id = links
        .select(config.web_id.as_deref())
        .context(WebIdSnafu)?;

    tracing::debug!(url = %credentials_url, %web_id, "requesting client credentials");
    let minted: MintedCredentials = ProviderRequest::post(credentials_url.as_uri())
        .header(AUTHORIZATION, authorization)
        .json(&MintRequest {
            name: &config.token_name,
            web_id: &web_id,
        })
        .send_json(http_client)
        .await
        .context(MintSnafu)?;

    Ok(minted.into())
}
