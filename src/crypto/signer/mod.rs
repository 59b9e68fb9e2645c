//! Cryptographic signing key traits.

mod es256;
mod r#trait;

pub use es256::Es256PrivateKey;
pub use r#trait::{HasPublicKey, JwsSigningKey};
