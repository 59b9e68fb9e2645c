//! The [`Error`] trait shared by every error in this crate.
//!
//! The library never retries on its own. [`Error::is_retryable`] only
//! classifies a failure so that callers can decide whether running the whole
//! flow again is worthwhile.

use std::convert::Infallible;

use snafu::AsErrorSource;

use crate::platform::MaybeSendSync;

/// Errors that may occur in the library.
pub trait Error: std::error::Error + AsErrorSource + MaybeSendSync + 'static {
    /// If true, running the failed flow again from scratch may succeed.
    fn is_retryable(&self) -> bool;
}

impl Error for Infallible {
    fn is_retryable(&self) -> bool {
        false
    }
}
