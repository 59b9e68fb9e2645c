//! Client authentication at the token endpoint.
//!
//! Credentials minted by the provider are presented with HTTP Basic
//! authentication (RFC 6749 §2.3.1).

mod client_secret;

pub use client_secret::{ClientSecret, ClientSecretError};
