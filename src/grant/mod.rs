//! Obtaining `DPoP`-bound access tokens.
//!
//! [`acquire_access_token`] runs the client credentials grant against a
//! provider's token endpoint with a freshly generated key pair. The lower
//! level [`ClientCredentialsGrant`] accepts any signer and scope.

mod acquire;
mod client_credentials;
mod token_response;

pub use acquire::{DPoPBoundToken, TokenAcquisitionError, acquire_access_token};
pub use client_credentials::{
    ClientCredentialsGrant, ClientCredentialsGrantBuilder, ClientCredentialsGrantError,
    OAuth2ErrorBody,
};
pub use token_response::TokenResponse;

/// Standard implementation for converting a sequence of scopes into a scope string.
pub(crate) fn mk_scopes(scopes: impl IntoIterator<Item = impl Into<String>>) -> Option<String> {
    let maybe_scopes = scopes
        .into_iter()
        .filter_map(|s| {
            let s = s.into();
            (!s.trim().is_empty()).then_some(s)
        })
        .collect::<Vec<_>>();

    (!maybe_scopes.is_empty()).then(|| maybe_scopes.join(" "))
}
