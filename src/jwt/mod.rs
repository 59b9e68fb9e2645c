//! Signed JWTs in compact serialization.
//!
//! Only what `DPoP` proofs need: a header with `alg`, `typ` and extra members,
//! claims with `iat`, `exp`, `jti` and extra members, signed by a
//! [`JwsSigningKey`](crate::crypto::signer::JwsSigningKey).

mod builder;

pub use builder::{JwsSerializationError, Jwt, JwtBuilder};
