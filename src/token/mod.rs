//! Bearer material issued by the provider.

mod access_token;

pub use access_token::AccessToken;
