//! Client credentials and `DPoP` authentication for Community Solid Server
//! identity providers.

#![forbid(unsafe_code)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::panic))]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod account;
pub mod client_auth;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod dpop;
mod endpoint_url;
mod error;
pub mod fetch;
pub mod grant;
pub mod http;
pub mod jwk;
pub mod jwt;
pub mod platform;
pub mod prelude;
pub mod provider;
pub mod token;

pub use account::{AccountDescriptor, NewAccount, create_account};
pub use config::FetchConfig;
pub use endpoint_url::{EndpointUrl, IntoEndpointUrl, InvalidEndpointUrlError};
pub use error::Error;
pub use fetch::{
    AuthenticatedClient, get_authenticated_fetch, get_authenticated_fetch_with_credentials,
};

/// Documentation
pub mod _documentation {
    #[doc = include_str!("../README.md")]
    mod readme {}
}

/// Re-export of parts of the `secrecy` crate.
pub mod secrecy {
    pub use ::secrecy::{ExposeSecret, SecretString};
}

pub use bytes::Bytes;
