use base64::prelude::*;
use http::{HeaderValue, header::InvalidHeaderValue};
use secrecy::{ExposeSecret as _, SecretString};
use snafu::prelude::*;

/// Client Secret authentication (RFC 6749 §2.3.1) using the Basic scheme.
#[derive(Debug, Clone)]
pub struct ClientSecret {
    client_id: String,
    client_secret: SecretString,
}

impl ClientSecret {
    /// Creates client authentication for the given identifier and secret.
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// The client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Builds the `Authorization` header value.
    ///
    /// Both parts are form-urlencoded before being joined with `:`, so a
    /// colon inside the identifier or secret cannot be misread as the
    /// separator.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoded value is not a valid header value.
    pub fn basic_authorization(&self) -> Result<HeaderValue, ClientSecretError> {
        use url::form_urlencoded::byte_serialize;
        let client_id: String = byte_serialize(self.client_id.as_bytes()).collect();
        let client_secret: String =
            byte_serialize(self.client_secret.expose_secret().as_bytes()).collect();

        let credentials = format!("{client_id}:{client_secret}");
        let auth_header = format!("Basic {}", BASE64_STANDARD.encode(credentials.as_bytes()));

        let mut value = HeaderValue::from_str(&auth_header).context(InvalidHeaderSnafu)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Errors that may occur when calculating client credentials.
#[derive(Debug, Snafu)]
pub enum ClientSecretError {
    /// The calculated header value was invalid.
    #[snafu(display("Invalid header value"))]
    InvalidHeader {
        /// The underlying error.
        source: InvalidHeaderValue,
    },
}

impl crate::Error for ClientSecretError {
    fn is_retryable(&self) -> bool {
        false
    }
}
