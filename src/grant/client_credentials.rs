//! Client credentials grant (RFC 6749 §4.4) with `DPoP`-bound tokens.

use bon::Builder;
use http::{
    HeaderValue,
    header::{AUTHORIZATION, InvalidHeaderValue},
};
use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    EndpointUrl, IntoEndpointUrl,
    client_auth::{ClientSecret, ClientSecretError},
    crypto::signer::{Es256PrivateKey, HasPublicKey, JwsSigningKey},
    dpop::{DPOP_HEADER, DPoP, DPoPProofError},
    grant::{DPoPBoundToken, TokenResponse, mk_scopes},
    http::{HttpClient, HttpResponse, ProviderRequest, Received, SendError},
};

/// A client credentials grant whose tokens are bound to a `DPoP` key.
#[derive(Debug, Builder)]
#[builder(state_mod(name = "builder"))]
pub struct ClientCredentialsGrant<Sgn: JwsSigningKey + HasPublicKey = Es256PrivateKey> {
    /// The client authentication.
    client_auth: ClientSecret,

    /// The `DPoP` signer the token will be bound to.
    dpop: DPoP<Sgn>,

    /// The URL of the token endpoint.
    #[builder(setters(name = "token_endpoint_url"))]
    token_endpoint: EndpointUrl,

    /// The requested scope.
    #[builder(required, default, name = "scopes", with = |scopes: impl IntoIterator<Item = impl Into<String>>| mk_scopes(scopes))]
    scope: Option<String>,
}

impl<Sgn: JwsSigningKey + HasPublicKey, S: builder::State> ClientCredentialsGrantBuilder<Sgn, S> {
    /// Sets the token endpoint URL.
    ///
    /// Accepts any type that implements [`IntoEndpointUrl`], including
    /// `&str`, [`String`], `&`[`Url`](url::Url), [`Uri`](http::Uri), and
    /// [`EndpointUrl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed as a valid URI.
    pub fn token_endpoint<U: IntoEndpointUrl>(
        self,
        url: U,
    ) -> Result<ClientCredentialsGrantBuilder<Sgn, builder::SetTokenEndpoint<S>>, U::Error>
    where
        S::TokenEndpoint: builder::IsUnset,
    {
        Ok(self.token_endpoint_url(url.into_endpoint_url()?))
    }
}

/// Client credentials grant body.
#[derive(Debug, Serialize)]
struct ClientCredentialsGrantForm<'a> {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

impl<Sgn: JwsSigningKey + HasPublicKey> ClientCredentialsGrant<Sgn> {
    /// The token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> &EndpointUrl {
        &self.token_endpoint
    }

    /// The `DPoP` signer.
    #[must_use]
    pub fn dpop(&self) -> &DPoP<Sgn> {
        &self.dpop
    }

    /// Requests an access token and pairs it with this grant's signer.
    ///
    /// # Errors
    ///
    /// See [`ClientCredentialsGrant::exchange`].
    pub async fn request_bound_token<C: HttpClient>(
        self,
        http_client: &C,
    ) -> Result<
        DPoPBoundToken<Sgn>,
        ClientCredentialsGrantError<C::Error, <C::Response as HttpResponse>::Error, Sgn::Error>,
    > {
        let response = self.exchange(http_client).await?;
        Ok(DPoPBoundToken::new(response, self.dpop))
    }

    /// Requests an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be built or signed, the
    /// token endpoint rejects it, or the issued token is not `DPoP` bound.
    pub async fn exchange<C: HttpClient>(
        &self,
        http_client: &C,
    ) -> Result<
        TokenResponse,
        ClientCredentialsGrantError<C::Error, <C::Response as HttpResponse>::Error, Sgn::Error>,
    > {
        let form = ClientCredentialsGrantForm {
            grant_type: "client_credentials",
            scope: self.scope.as_deref(),
        };
        let body = serde_html_form::to_string(&form).context(SerializeFormSnafu)?;

        let authorization = self
            .client_auth
            .basic_authorization()
            .context(ClientAuthSnafu)?;

        let uri = self.token_endpoint.as_uri();
        let proof = self
            .dpop
            .proof(&http::Method::POST, uri, None)
            .await
            .context(DPoPProofSnafu)?;
        let proof = HeaderValue::from_str(proof.expose_secret()).context(BadHeaderSnafu)?;

        tracing::debug!(
            token_endpoint = %self.token_endpoint,
            client_id = self.client_auth.client_id(),
            jkt = self.dpop.jwk_thumbprint(),
            "requesting access token"
        );
        let Received { body, .. } = ProviderRequest::post(uri)
            .header(AUTHORIZATION, authorization)
            .header(DPOP_HEADER, proof)
            .body(
                HeaderValue::from_static("application/x-www-form-urlencoded"),
                body,
            )
            .send(http_client)
            .await
            .context(SendSnafu)?;

        let response: TokenResponse =
            serde_json::from_slice(&body).context(DeserializeSnafu { body: body.clone() })?;

        if let Some(token_type) = &response.token_type {
            ensure!(
                token_type.eq_ignore_ascii_case("DPoP"),
                UnexpectedTokenTypeSnafu { token_type }
            );
        }

        Ok(response)
    }
}

/// Errors from [`ClientCredentialsGrant::exchange`].
#[derive(Debug, Snafu)]
pub enum ClientCredentialsGrantError<
    HttpReqErr: crate::Error + 'static,
    HttpRespErr: crate::Error + 'static,
    SgnErr: crate::Error + 'static,
> {
    /// There was an error when attempting to serialize the form parameters.
    #[snafu(display("Failed to serialize exchange parameters"))]
    SerializeForm {
        /// The underlying error.
        source: serde_html_form::ser::Error,
    },
    /// The client authentication could not be computed.
    #[snafu(display("Failed to compute client authentication"))]
    ClientAuth {
        /// The underlying error.
        source: ClientSecretError,
    },
    /// The `DPoP` proof could not be signed.
    #[snafu(display("Failed to sign DPoP proof"))]
    DPoPProof {
        /// The underlying error.
        source: DPoPProofError<SgnErr>,
    },
    /// The provided header value was invalid.
    #[snafu(display("Provided header value was invalid"))]
    BadHeader {
        /// The underlying error.
        source: InvalidHeaderValue,
    },
    /// The token request failed or was rejected.
    #[snafu(display("Token request failed"))]
    Send {
        /// The underlying error.
        source: SendError<HttpReqErr, HttpRespErr>,
    },
    /// The response had a success response code but could not be parsed.
    #[snafu(display(
        "Failed to parse successful response as an OAuth2 payload: {}",
        String::from_utf8_lossy(body)
    ))]
    Deserialize {
        /// The unparseable body.
        body: bytes::Bytes,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// The provider issued a token that is not bound to the proof key.
    #[snafu(display("Expected a DPoP token, got token type '{token_type}'"))]
    UnexpectedTokenType {
        /// The token type that was issued.
        token_type: String,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error, SgnErr: crate::Error>
    ClientCredentialsGrantError<HttpReqErr, HttpRespErr, SgnErr>
{
    /// Parses the rejected response as an `OAuth2` error body.
    #[must_use]
    pub fn oauth2_error(&self) -> Option<OAuth2ErrorBody> {
        match self {
            Self::Send { source } => source
                .upstream_failure()
                .and_then(|(_, body)| serde_json::from_slice(body).ok()),
            _ => None,
        }
    }
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error, SgnErr: crate::Error> crate::Error
    for ClientCredentialsGrantError<HttpReqErr, HttpRespErr, SgnErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::SerializeForm { .. }
            | Self::BadHeader { .. }
            | Self::Deserialize { .. }
            | Self::UnexpectedTokenType { .. } => false,
            Self::ClientAuth { source } => source.is_retryable(),
            Self::DPoPProof { source } => source.is_retryable(),
            Self::Send { source } => source.is_retryable(),
        }
    }
}

/// The `OAuth2` error response.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2ErrorBody {
    /// The error field from the `OAuth2` error.
    pub error: String,
    /// The `error_description` field from the `OAuth2` error.
    pub error_description: Option<String>,
}
