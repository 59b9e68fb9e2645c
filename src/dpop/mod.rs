//! Demonstrating Proof-of-Possession (`DPoP`, RFC 9449).
//!
//! A [`DPoP`] owns the session key pair and signs one proof per HTTP request.
//! Proofs for the token endpoint carry no access token hash; proofs for
//! resource requests carry `ath`, binding them to the token as well as the key.

mod proof;

pub use proof::{DPoP, DPoPProofError};

#[cfg(test)]
pub(crate) use proof::tests::{VerifiedProof, verify_proof};

/// The request header carrying a proof.
pub const DPOP_HEADER: &str = "dpop";
