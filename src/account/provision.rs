use bon::Builder;
use http::header::COOKIE;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use url::Url;

use crate::{
    account::{
        MissingControlError, SessionJar,
        controls::{AccountControls, require},
    },
    config::FetchConfig,
    http::{HttpClient, HttpResponse, ProviderRequest, SendError},
    provider::{ACCOUNT_CREATE_PATH, ACCOUNT_INDEX_PATH, ProviderUrl, ProviderUrlError},
};

/// The account to register.
#[derive(Debug, Clone, Builder)]
pub struct NewAccount {
    /// Pod name; also the first path segment of the pod URL.
    #[builder(into)]
    pub username: String,
    /// Login password.
    #[builder(into)]
    pub password: SecretString,
    /// Login email.
    #[builder(into)]
    pub email: String,
    /// The provider to register with.
    pub provider: ProviderUrl,
}

/// Everything needed to use a freshly created account.
#[derive(Debug, Clone)]
pub struct AccountDescriptor {
    /// The identity provider root.
    pub idp: Url,
    /// The created pod.
    pub pod_url: String,
    /// The WebID created with the pod.
    pub web_id: String,
    /// Pod name.
    pub username: String,
    /// Login password.
    pub password: SecretString,
    /// Login email.
    pub email: String,
}

impl AccountDescriptor {
    /// Returns a configuration that authenticates as this account.
    #[must_use]
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig::builder()
            .oidc_issuer(self.idp.as_str())
            .email(self.email.as_str())
            .password(self.password.clone())
            .web_id(self.web_id.as_str())
            .build()
    }
}

/// Creates an account with a password login and a pod.
///
/// The steps share a cookie session started by the first request. A step
/// that fails leaves whatever the earlier steps created in place.
///
/// # Errors
///
/// Returns an error if any step is rejected by the provider, the provider
/// does not start a session, or a required control is missing.
#[tracing::instrument(
    name = "create_account",
    skip_all,
    fields(provider = %account.provider, username = %account.username)
)]
pub async fn create_account<C: HttpClient>(
    account: NewAccount,
    http_client: &C,
) -> Result<AccountDescriptor, CreateAccountError<C::Error, <C::Response as HttpResponse>::Error>>
{
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct PasswordRegistration<'a> {
        email: &'a str,
        password: &'a str,
        confirm_password: &'a str,
    }

    #[derive(Serialize)]
    struct PodRequest<'a> {
        name: &'a str,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PodCreated {
        pod: String,
        web_id: String,
    }

    let provider = &account.provider;
    let mut session = SessionJar::default();

    let create_url = provider
        .resolve(ACCOUNT_CREATE_PATH)
        .context(ProviderSnafu)?;
    tracing::debug!(url = %create_url, "creating account");
    let created = ProviderRequest::post(create_url.as_uri())
        .send(http_client)
        .await
        .context(CreateAccountSnafu)?;
    session.store(create_url.as_uri(), &created.headers);
    ensure!(!session.is_empty(), MissingSessionCookieSnafu);

    let index_url = provider
        .resolve(ACCOUNT_INDEX_PATH)
        .context(ProviderSnafu)?;
    tracing::debug!(url = %index_url, "fetching account controls");
    let controls: AccountControls = ProviderRequest::get(index_url.as_uri())
        .maybe_header(COOKIE, session.cookie_header(index_url.as_uri()))
        .send_json(http_client)
        .await
        .context(ControlsSnafu)?;
    let password_create = require(
        controls.controls.password.create.as_ref(),
        "password.create",
    )
    .context(MissingControlSnafu)?;
    let pod_create =
        require(controls.controls.account.pod.as_ref(), "account.pod").context(MissingControlSnafu)?;

    tracing::debug!(url = %password_create, "registering password login");
    let password = account.password.expose_secret();
    let received = ProviderRequest::post(password_create.as_uri())
        .maybe_header(COOKIE, session.cookie_header(password_create.as_uri()))
        .json(&PasswordRegistration {
            email: &account.email,
            password,
            confirm_password: password,
        })
        .send(http_client)
        .await
        .context(RegisterPasswordSnafu)?;
    session.store(password_create.as_uri(), &received.headers);

    tracing::debug!(url = %pod_create, "creating pod");
    let pod: PodCreated = ProviderRequest::post(pod_create.as_uri())
        .maybe_header(COOKIE, session.cookie_header(pod_create.as_uri()))
        .json(&PodRequest {
            name: &account.username,
        })
        .send_json(http_client)
        .await
        .context(CreatePodSnafu)?;
    tracing::debug!(pod = %pod.pod, web_id = %pod.web_id, "account created");

    Ok(AccountDescriptor {
        idp: provider.idp(),
        pod_url: pod.pod,
        web_id: pod.web_id,
        username: account.username,
        password: account.password,
        email: account.email,
    })
}

/// Errors from [`create_account`].
#[derive(Debug, Snafu)]
pub enum CreateAccountError<HttpReqErr: crate::Error + 'static, HttpRespErr: crate::Error + 'static>
{
    /// An endpoint could not be resolved against the provider URL.
    #[snafu(display("Failed to resolve account endpoint"))]
    Provider {
        /// The underlying error.
        source: ProviderUrlError,
    },
    /// The anonymous account creation request failed.
    #[snafu(display("Failed to create account"))]
    CreateAccount {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
    /// Account creation succeeded without starting a cookie session.
    #[snafu(display("Account creation response did not set a session cookie"))]
    MissingSessionCookie,
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
    /// The password login could not be registered.
    #[snafu(display("Failed to register password login"))]
    RegisterPassword {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
    /// The pod could not be created.
    #[snafu(display("Failed to create pod"))]
    CreatePod {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> CreateAccountError<HttpReqErr, HttpRespErr> {
    /// Returns the failed provider request, if the provider rejected a step.
    #[must_use]
    pub fn send_error(&self) -> Option<&SendError<HttpReqErr, HttpRespErr>> {
        match self {
            Self::CreateAccount { source }
            | Self::Controls { source }
            | Self::RegisterPassword { source }
            | Self::CreatePod { source } => Some(source),
            Self::Provider { .. } | Self::MissingSessionCookie | Self::MissingControl { .. } => {
                None
            }
        }
    }
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for CreateAccountError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        self.send_error().is_some_and(crate::Error::is_retryable)
    }
}
