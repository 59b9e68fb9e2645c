use bytes::Bytes;
use http::{
    HeaderMap, HeaderValue, Method, Request, StatusCode, Uri,
    header::{CONTENT_TYPE, IntoHeaderName},
};
use serde::{Serialize, de::DeserializeOwned};
use snafu::prelude::*;

use crate::http::{HttpClient, HttpResponse};

/// Errors from a single request to the provider.
#[derive(Debug, Snafu)]
pub enum SendError<HttpReqErr: crate::Error + 'static, HttpRespErr: crate::Error + 'static> {
    /// The transport failed to execute the request.
    #[snafu(display("Failed to make HTTP request"))]
    Request {
        /// The underlying transport error.
        source: HttpReqErr,
    },
    /// The response body could not be read.
    #[snafu(display("Failed to read response body"))]
    Response {
        /// The underlying transport error.
        source: HttpRespErr,
    },
    /// The JSON request body could not be encoded.
    #[snafu(display("Failed to encode request body"))]
    EncodeBody {
        /// The underlying error.
        source: serde_json::Error,
    },
    /// A successful response did not have the expected shape.
    #[snafu(display("Failed to parse response body: {}", String::from_utf8_lossy(body)))]
    Deserialize {
        /// The unparseable body.
        body: Bytes,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// The provider answered with a non-success status.
    #[snafu(display("Query was not successful: {status} {}", String::from_utf8_lossy(body)))]
    UpstreamRequestFailed {
        /// The status returned by the provider.
        status: StatusCode,
        /// The response body, exactly as received.
        body: Bytes,
    },
}

/// The [`SendError`] produced by a given [`HttpClient`].
pub type SendErrorFor<C> =
    SendError<<C as HttpClient>::Error, <<C as HttpClient>::Response as HttpResponse>::Error>;

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> SendError<HttpReqErr, HttpRespErr> {
    /// Returns the upstream status and body when the provider rejected the request.
    #[must_use]
    pub fn upstream_failure(&self) -> Option<(StatusCode, &Bytes)> {
        match self {
            Self::UpstreamRequestFailed { status, body } => Some((*status, body)),
            _ => None,
        }
    }
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for SendError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Request { source } => source.is_retryable(),
            Self::Response { source } => source.is_retryable(),
            Self::EncodeBody { .. } | Self::Deserialize { .. } => false,
            Self::UpstreamRequestFailed { status, .. } => status.is_server_error(),
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug)]
pub(crate) struct Received {
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A request to one of the provider's endpoints.
#[derive(Debug)]
pub(crate) struct ProviderRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, serde_json::Error>,
}

impl ProviderRequest {
    pub fn new(method: Method, uri: &Uri) -> Self {
        Self {
            method,
            uri: uri.clone(),
            headers: HeaderMap::new(),
            body: Ok(Bytes::new()),
        }
    }

    pub fn get(uri: &Uri) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &Uri) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn maybe_header(self, name: impl IntoHeaderName, value: Option<HeaderValue>) -> Self {
        match value {
            Some(value) => self.header(name, value),
            None => self,
        }
    }

    /// Sets a body with the given content type.
    pub fn body(mut self, content_type: HeaderValue, body: impl Into<Bytes>) -> Self {
        self.body = Ok(body.into());
        self.headers.insert(CONTENT_TYPE, content_type);
        self
    }

    /// Sets a JSON body; an encoding failure is reported when the request is sent.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = serde_json::to_vec(body).map(Bytes::from);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    fn into_request(self) -> Result<Request<Bytes>, serde_json::Error> {
        let body = self.body?;
        let (mut parts, ()) = Request::new(()).into_parts();
        parts.method = self.method;
        parts.uri = self.uri;
        parts.headers = self.headers;
        Ok(Request::from_parts(parts, body))
    }

    /// Sends the request, failing unless the provider answers with a 2xx status.
    pub async fn send<C: HttpClient>(self, http_client: &C) -> Result<Received, SendErrorFor<C>> {
        let method = self.method.clone();
        let uri = self.uri.clone();
        let request = self.into_request().context(EncodeBodySnafu)?;

        let response = http_client.execute(request).await.context(RequestSnafu)?;
        let status = response.status();
        let headers = response.headers();
        let body = response.body().await.context(ResponseSnafu)?;
        tracing::trace!(%method, %uri, %status, "provider responded");

        ensure!(status.is_success(), UpstreamRequestFailedSnafu { status, body });

        Ok(Received { headers, body })
    }

    /// Sends the request and parses the successful response body as JSON.
    pub async fn send_json<C: HttpClient, T: DeserializeOwned>(
        self,
        http_client: &C,
    ) -> Result<T, SendErrorFor<C>> {
        let Received { body, .. } = self.send(http_client).await?;
        serde_json::from_slice(&body).context(DeserializeSnafu { body: body.clone() })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::mock::{MockHttpClient, MockResponse};

    #[tokio::test]
    async fn test_non_success_preserves_status_and_body() {
        let client = MockHttpClient::new([MockResponse::text(403, "nope, not you")]);
        let uri: Uri = "http://localhost:3000/.account/".parse().unwrap();

        let err = ProviderRequest::get(&uri).send(&client).await.unwrap_err();

        let (status, body) = err.upstream_failure().expect("upstream failure");
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.as_ref(), b"nope, not you");
        assert_eq!(err.to_string(), "Query was not successful: 403 Forbidden nope, not you");
    }

    #[tokio::test]
    async fn test_json_body_sets_content_type() {
        let client = MockHttpClient::new([MockResponse::json(200, json!({"ok": true}))]);
        let uri: Uri = "http://localhost:3000/login".parse().unwrap();

        let parsed: serde_json::Value = ProviderRequest::post(&uri)
            .json(&json!({"email": "a@example"}))
            .send_json(&client)
            .await
            .unwrap();

        assert_eq!(parsed, json!({"ok": true}));
        let recorded = client.requests();
        assert_eq!(recorded[0].method, Method::POST);
        assert_eq!(recorded[0].headers[CONTENT_TYPE], "application/json");
        assert_eq!(recorded[0].json(), json!({"email": "a@example"}));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_deserialize_error() {
        let client = MockHttpClient::new([MockResponse::text(200, "<html/>")]);
        let uri: Uri = "http://localhost:3000/".parse().unwrap();

        let err = ProviderRequest::get(&uri)
            .send_json::<_, serde_json::Value>(&client)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::Deserialize { .. }));
        assert!(!crate::Error::is_retryable(&err));
    }
}
