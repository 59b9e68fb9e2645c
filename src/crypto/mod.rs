//! Cryptographic interfaces and definitions.
//!
//! `DPoP` needs exactly two capabilities from a key pair: sign bytes and
//! publish the public key as a JWK. These are expressed as traits so that a
//! caller can keep the private key in an external store, while
//! [`signer::Es256PrivateKey`] provides an in-memory default.

pub mod signer;
