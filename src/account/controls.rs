use serde::Deserialize;
use snafu::prelude::*;

use crate::EndpointUrl;

/// The control document served at `.account/`.
///
/// Which controls are present depends on the caller: an anonymous request
/// sees `password.login`, a request carrying an account session also sees
/// the account-scoped controls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountControls {
    /// The controls, grouped by area.
    #[serde(default)]
    pub controls: Controls,
}

/// Controls grouped by area.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Controls {
    /// Password login and registration.
    #[serde(default)]
    pub password: PasswordControls,
    /// Account-scoped resources.
    #[serde(default)]
    pub account: AccountScopedControls,
}

/// Password controls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordControls {
    /// Logs in with email and password.
    pub login: Option<EndpointUrl>,
    /// Registers an email and password login for the current account.
    pub create: Option<EndpointUrl>,
}

/// Account-scoped controls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountScopedControls {
    /// Creates a new account.
    pub create: Option<EndpointUrl>,
    /// Lists and links WebIDs.
    pub web_id: Option<EndpointUrl>,
    /// Creates pods.
    pub pod: Option<EndpointUrl>,
    /// Lists and mints client credentials.
    pub client_credentials: Option<EndpointUrl>,
}

/// A control required by the current step was not offered.
#[derive(Debug, Snafu)]
#[snafu(display("Provider did not offer the '{name}' control"))]
pub struct MissingControlError {
    /// The dotted name of the control, e.g. `password.login`.
    pub name: &'static str,
}

impl crate::Error for MissingControlError {
    fn is_retryable(&self) -> bool {
        false
    }
}

pub(crate) fn require<'a>(
    control: Option<&'a EndpointUrl>,
    name: &'static str,
) -> Result<&'a EndpointUrl, MissingControlError> {
    control.context(MissingControlSnafu { name })
}
