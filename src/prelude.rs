//! Imports for syntax extensions.

pub use crate::IntoEndpointUrl as _;
pub use crate::crypto::signer::HasPublicKey as _;
pub use crate::crypto::signer::JwsSigningKey as _;
pub use crate::http::{HttpClient as _, HttpResponse as _};
