//! Settings for [`get_authenticated_fetch`](crate::get_authenticated_fetch).

use std::env::VarError;

use bon::Builder;
use secrecy::SecretString;
use snafu::prelude::*;

use crate::provider::{ProviderDialect, ProviderUrl, ProviderUrlError, UnknownDialectError};

/// Default name given to minted client credentials.
pub const DEFAULT_TOKEN_NAME: &str = "my-token";

const ENV_OIDC_ISSUER: &str = "CSS_OIDC_ISSUER";
const ENV_PROVIDER: &str = "CSS_PROVIDER";
const ENV_EMAIL: &str = "CSS_EMAIL";
const ENV_PASSWORD: &str = "CSS_PASSWORD";
const ENV_WEBID: &str = "CSS_WEBID";
const ENV_TOKEN_NAME: &str = "CSS_TOKEN_NAME";
const ENV_DIALECT: &str = "CSS_DIALECT";

/// Account settings used to obtain an authenticated client.
#[derive(Debug, Clone, Builder)]
pub struct FetchConfig {
    /// Base URL of the identity provider.
    #[builder(into)]
    pub oidc_issuer: Option<String>,
    /// Older name for `oidc_issuer`, used only when that is absent.
    #[builder(into)]
    pub provider: Option<String>,
    /// Account email.
    #[builder(into)]
    pub email: String,
    /// Account password.
    #[builder(into)]
    pub password: SecretString,
    /// The WebID the credentials are minted for.
    ///
    /// Required when the account links more than one WebID.
    #[builder(into)]
    pub web_id: Option<String>,
    /// Name given to the minted client credentials.
    #[builder(into, default = DEFAULT_TOKEN_NAME)]
    pub token_name: String,
    /// How the provider mints credentials.
    #[builder(default)]
    pub dialect: ProviderDialect,
}

/// A [`FetchConfig`] with the issuer chosen and validated.
#[derive(Debug, Clone)]
pub struct ResolvedFetchConfig {
    /// The identity provider.
    pub issuer: ProviderUrl,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: SecretString,
    /// Requested WebID, if any.
    pub web_id: Option<String>,
    /// Name given to the minted client credentials.
    pub token_name: String,
    /// How the provider mints credentials.
    pub dialect: ProviderDialect,
}

impl FetchConfig {
    /// Picks the issuer (`oidc_issuer` over `provider`) and parses it.
    ///
    /// # Errors
    ///
    /// Returns an error if neither issuer field is set, or the chosen one is
    /// not an HTTP(S) URL.
    pub fn resolve(&self) -> Result<ResolvedFetchConfig, ConfigError> {
        let issuer = self
            .oidc_issuer
            .as_deref()
            .or(self.provider.as_deref())
            .context(MissingIssuerSnafu)?;
        let issuer = ProviderUrl::parse(issuer).context(IssuerSnafu)?;

        Ok(ResolvedFetchConfig {
            issuer,
            email: self.email.clone(),
            password: self.password.clone(),
            web_id: self.web_id.clone(),
            token_name: self.token_name.clone(),
            dialect: self.dialect,
        })
    }

    /// Reads the configuration from `CSS_*` environment variables.
    ///
    /// `CSS_EMAIL` and `CSS_PASSWORD` are required. `CSS_OIDC_ISSUER` (or
    /// `CSS_PROVIDER`), `CSS_WEBID`, `CSS_TOKEN_NAME` and `CSS_DIALECT` are
    /// optional; the issuer is checked by [`FetchConfig::resolve`].
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, any variable is
    /// not valid unicode, or the dialect is not recognised.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<String, VarError>,
    ) -> Result<Self, ConfigError> {
        let optional = |var_name: &'static str| match lookup(var_name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(source) => Err(source).context(EnvAccessSnafu { var_name }),
        };
        let required =
            |var_name: &'static str| lookup(var_name).context(EnvAccessSnafu { var_name });

        let dialect = match optional(ENV_DIALECT)? {
            Some(value) => value.parse().context(DialectSnafu)?,
            None => ProviderDialect::default(),
        };

        Ok(Self::builder()
            .maybe_oidc_issuer(optional(ENV_OIDC_ISSUER)?)
            .maybe_provider(optional(ENV_PROVIDER)?)
            .email(required(ENV_EMAIL)?)
            .password(SecretString::from(required(ENV_PASSWORD)?))
            .maybe_web_id(optional(ENV_WEBID)?)
            .maybe_token_name(optional(ENV_TOKEN_NAME)?)
            .dialect(dialect)
            .build())
    }
}

/// Errors from building or resolving a [`FetchConfig`].
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// Neither `oidc_issuer` nor `provider` was given.
    #[snafu(display("No identity provider configured: set oidc_issuer or provider"))]
    MissingIssuer,
    /// The issuer URL is not usable.
    #[snafu(display("Invalid identity provider URL"))]
    Issuer {
        /// The underlying error.
        source: ProviderUrlError,
    },
    /// The environment variable was not found or was not valid unicode.
    #[snafu(display("Failed to read env variable '{var_name}'"))]
    EnvAccess {
        /// The name of the environment variable that could not be accessed.
        var_name: &'static str,
        /// The underlying error from the environment variable lookup.
        source: VarError,
    },
    /// The dialect variable holds an unknown value.
    #[snafu(display("Invalid provider dialect"))]
    Dialect {
        /// The underlying error.
        source: UnknownDialectError,
    },
}

impl crate::Error for ConfigError {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret as _;

    use super::*;

    fn lookup(
        vars: &[(&'static str, &'static str)],
    ) -> impl Fn(&'static str) -> Result<String, VarError> {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |name| {
            vars.get(name)
                .map(|value| (*value).to_owned())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn test_issuer_precedence() {
        let config = FetchConfig::builder()
            .oidc_issuer("http://issuer.example/")
            .provider("http://provider.example/")
            .email("a@example.org")
            .password(SecretString::from("pw"))
            .build();

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.issuer.as_url().as_str(), "http://issuer.example/");
        assert_eq!(resolved.token_name, DEFAULT_TOKEN_NAME);
        assert_eq!(resolved.dialect, ProviderDialect::AccountApi);
    }

    #[test]
    fn test_provider_used_as_fallback() {
        let config = FetchConfig::builder()
            .provider("http://provider.example")
            .email("a@example.org")
            .password(SecretString::from("pw"))
            .build();

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.issuer.as_url().as_str(), "http://provider.example/");
    }

    #[test]
    fn test_missing_issuer() {
        let config = FetchConfig::builder()
            .email("a@example.org")
            .password(SecretString::from("pw"))
            .build();

        assert!(matches!(config.resolve(), Err(ConfigError::MissingIssuer)));
    }

    #[test]
    fn test_from_lookup() {
        let config = FetchConfig::from_lookup(lookup(&[
            (ENV_PROVIDER, "http://localhost:3000"),
            (ENV_EMAIL, "hello@example.com"),
            (ENV_PASSWORD, "abc123"),
            (ENV_DIALECT, "6.x"),
            (ENV_TOKEN_NAME, "ci-token"),
        ]))
        .unwrap();

        assert_eq!(config.oidc_issuer, None);
        assert_eq!(config.provider.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.password.expose_secret(), "abc123");
        assert_eq!(config.token_name, "ci-token");
        assert_eq!(config.dialect, ProviderDialect::Direct);
    }

    #[test]
    fn test_from_lookup_requires_password() {
        let err = FetchConfig::from_lookup(lookup(&[(ENV_EMAIL, "hello@example.com")]))
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::EnvAccess {
                var_name: ENV_PASSWORD,
                ..
            }
        ));
    }
}
