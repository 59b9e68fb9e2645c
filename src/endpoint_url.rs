//! Absolute request URLs.
//!
//! Every URL this crate sends a request to is an [`EndpointUrl`]: an absolute
//! `http` or `https` URI. Control documents returned by the provider
//! deserialize straight into it, so a relative or malformed control is
//! rejected when the document is parsed rather than when it is followed.

use std::{convert::Infallible, fmt, str::FromStr};

use http::{Uri, uri::InvalidUri};
use serde::{Deserialize, Deserializer};
use snafu::prelude::*;
use url::Url;

/// An absolute `http` or `https` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrl(Uri);

impl EndpointUrl {
    /// Returns the inner [`Uri`].
    #[must_use]
    pub fn as_uri(&self) -> &Uri {
        &self.0
    }

    /// Consumes the [`EndpointUrl`] and returns the inner [`Uri`].
    #[must_use]
    pub fn into_uri(self) -> Uri {
        self.0
    }

    fn from_uri(uri: Uri) -> Result<Self, InvalidEndpointUrlError> {
        let is_http = matches!(uri.scheme_str(), Some("http" | "https"));
        ensure!(
            is_http && uri.authority().is_some(),
            NotAbsoluteSnafu {
                url: uri.to_string()
            }
        );
        Ok(Self(uri))
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EndpointUrl {
    type Err = InvalidEndpointUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri = s.parse::<Uri>().context(ParseSnafu { url: s })?;
        Self::from_uri(uri)
    }
}

impl<'de> Deserialize<'de> for EndpointUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The value is not an absolute `http` or `https` URL.
#[derive(Debug, Snafu)]
pub enum InvalidEndpointUrlError {
    /// The value is not a URI at all.
    #[snafu(display("Invalid URL '{url}'"))]
    Parse {
        /// The rejected value.
        url: String,
        /// The underlying error.
        source: InvalidUri,
    },
    /// The URI lacks an `http(s)` scheme or a host.
    #[snafu(display("URL '{url}' is not an absolute http(s) URL"))]
    NotAbsolute {
        /// The rejected value.
        url: String,
    },
}

impl crate::Error for InvalidEndpointUrlError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Conversion trait for types that can be turned into an [`EndpointUrl`].
pub trait IntoEndpointUrl {
    /// The error type returned if the conversion fails.
    type Error;

    /// Attempts to convert this value into an [`EndpointUrl`].
    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error>;
}

impl IntoEndpointUrl for EndpointUrl {
    type Error = Infallible;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        Ok(self)
    }
}

impl IntoEndpointUrl for Uri {
    type Error = InvalidEndpointUrlError;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        EndpointUrl::from_uri(self)
    }
}

impl IntoEndpointUrl for &Url {
    type Error = InvalidEndpointUrlError;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        self.as_str().parse()
    }
}

impl IntoEndpointUrl for &str {
    type Error = InvalidEndpointUrlError;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        self.parse()
    }
}

impl IntoEndpointUrl for String {
    type Error = InvalidEndpointUrlError;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        self.parse()
    }
}
