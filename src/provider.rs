//! The identity provider's base URL and the protocol dialect it speaks.

use std::{fmt, str::FromStr};

use snafu::prelude::*;
use url::Url;

use crate::{EndpointUrl, IntoEndpointUrl as _, endpoint_url::InvalidEndpointUrlError};

/// Account API index, relative to the provider.
pub(crate) const ACCOUNT_INDEX_PATH: &str = ".account/";
/// Anonymous account creation, relative to the provider.
pub(crate) const ACCOUNT_CREATE_PATH: &str = ".account/account/";
/// Credential minting for [`ProviderDialect::Direct`], relative to the provider.
pub(crate) const DIRECT_CREDENTIALS_PATH: &str = "idp/credentials/";
/// The OIDC token endpoint, relative to the provider.
pub(crate) const TOKEN_PATH: &str = ".oidc/token";

/// The base URL of a Solid identity provider.
///
/// Endpoint paths are resolved against it the way a browser resolves a
/// relative link, so `http://localhost:3000` and `http://localhost:3000/`
/// are equivalent, while a base with a non-directory path such as
/// `http://localhost:3000/alice` resolves relative to `http://localhost:3000/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUrl(Url);

impl ProviderUrl {
    /// Parses and validates a provider URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an absolute `http` or `https` URL.
    pub fn parse(value: &str) -> Result<Self, ProviderUrlError> {
        let url = Url::parse(value).context(ParseSnafu { url: value })?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            UnsupportedSchemeSnafu {
                scheme: url.scheme()
            }
        );
        Ok(Self(url))
    }

    /// Returns the identity provider root, i.e. the base resolved against `./`.
    #[must_use]
    pub fn idp(&self) -> Url {
        self.0.join("./").unwrap_or_else(|_| self.0.clone())
    }

    /// Resolves a relative path against the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved URL is not a valid URI.
    pub fn resolve(&self, relative: &str) -> Result<EndpointUrl, ProviderUrlError> {
        let joined = self.0.join(relative).context(JoinSnafu { relative })?;
        (&joined).into_endpoint_url().context(InvalidUriSnafu)
    }

    /// Returns the URL as given.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for ProviderUrl {
    type Err = ProviderUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProviderUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors from parsing a provider URL or resolving endpoints against it.
#[derive(Debug, Snafu)]
pub enum ProviderUrlError {
    /// The provider URL could not be parsed.
    #[snafu(display("Invalid provider URL '{url}'"))]
    Parse {
        /// The rejected value.
        url: String,
        /// The underlying error.
        source: url::ParseError,
    },
    /// The provider URL is not an HTTP(S) URL.
    #[snafu(display("Unsupported provider URL scheme '{scheme}'"))]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },
    /// A relative endpoint path could not be joined to the provider URL.
    #[snafu(display("Failed to resolve '{relative}' against the provider URL"))]
    Join {
        /// The relative path.
        relative: String,
        /// The underlying error.
        source: url::ParseError,
    },
    /// The resolved URL is not a valid request URI.
    #[snafu(display("Resolved endpoint is not a valid request URL"))]
    InvalidUri {
        /// The underlying error.
        source: InvalidEndpointUrlError,
    },
}

impl crate::Error for ProviderUrlError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// How a provider mints client credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderDialect {
    /// Community Solid Server 6.x: one `POST` to the fixed `idp/credentials/`
    /// path with the account email and password.
    Direct,
    /// Community Solid Server 7.x: log in to the account API and mint the
    /// credential through endpoints discovered in its control documents.
    #[default]
    AccountApi,
}

impl FromStr for ProviderDialect {
    type Err = UnknownDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "6" | "6.x" | "direct" => Ok(Self::Direct),
            "7" | "7.x" | "account-api" | "account_api" => Ok(Self::AccountApi),
            _ => UnknownDialectSnafu { value: s }.fail(),
        }
    }
}

/// The dialect name was not recognised.
#[derive(Debug, Snafu)]
#[snafu(display("Unknown provider dialect '{value}', expected '6.x' or '7.x'"))]
pub struct UnknownDialectError {
    value: String,
}

impl crate::Error for UnknownDialectError {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_trailing_slash() {
        let provider = ProviderUrl::parse("http://localhost:3000").unwrap();

        assert_eq!(
            provider.resolve(ACCOUNT_INDEX_PATH).unwrap().to_string(),
            "http://localhost:3000/.account/"
        );
        assert_eq!(
            provider.resolve(TOKEN_PATH).unwrap().to_string(),
            "http://localhost:3000/.oidc/token"
        );
        assert_eq!(provider.idp().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_resolve_against_nested_base() {
        let provider = ProviderUrl::parse("https://solid.example/idp/").unwrap();

        assert_eq!(
            provider.resolve(DIRECT_CREDENTIALS_PATH).unwrap().to_string(),
            "https://solid.example/idp/idp/credentials/"
        );

        let file_like = ProviderUrl::parse("https://solid.example/alice").unwrap();
        assert_eq!(file_like.idp().as_str(), "https://solid.example/");
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(matches!(
            ProviderUrl::parse("ftp://solid.example/"),
            Err(ProviderUrlError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            ProviderUrl::parse("localhost:3000"),
            Err(ProviderUrlError::UnsupportedScheme { .. } | ProviderUrlError::Parse { .. })
        ));
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!("6.x".parse::<ProviderDialect>().unwrap(), ProviderDialect::Direct);
        assert_eq!(
            "account-api".parse::<ProviderDialect>().unwrap(),
            ProviderDialect::AccountApi
        );
        assert!("8.x".parse::<ProviderDialect>().is_err());
    }
}
