//! HTTP client and response abstractions.
//!
//! Every network call made by this crate goes through [`HttpClient`]. It is
//! the only seam between the authentication flows and the transport: supply
//! `reqwest::Client` (enabled by default), or any other implementation such
//! as a recording client in tests.
//!
//! [`AuthenticatedClient`](crate::fetch::AuthenticatedClient) implements the
//! same trait, so an authenticated transport can be used anywhere a plain one
//! is accepted.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "http-client-reqwest-0_13")]
mod reqwest_0_13;
mod send;

use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};

use crate::platform::{MaybeSend, MaybeSendSync};

pub(crate) use send::{ProviderRequest, Received};
pub use send::{SendError, SendErrorFor};

/// Defines the common interface for HTTP requests.
pub trait HttpClient: MaybeSendSync {
    /// The error type returned by the client for a failed request.
    type Error: crate::Error;

    /// The associated response type returned by this HTTP client.
    type Response: HttpResponse;

    /// Executes an HTTP request and returns an owned response.
    ///
    /// Implementations must not interpret the response status: a `404` or
    /// `500` is a successful execution.
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + MaybeSend;
}

impl<C: HttpClient> HttpClient for &C {
    type Error = C::Error;
    type Response = C::Response;

    async fn execute(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        (**self).execute(request).await
    }
}

/// Defines the common interface for HTTP responses.
pub trait HttpResponse: MaybeSendSync {
    /// The error type when getting the response body.
    type Error: crate::Error;

    /// Returns the HTTP status code of the response.
    fn status(&self) -> StatusCode;

    /// Returns the response's HTTP headers.
    fn headers(&self) -> HeaderMap;

    /// Consumes the response and asynchronously returns its body.
    fn body(self) -> impl Future<Output = Result<Bytes, Self::Error>> + MaybeSend;
}
