//! Platform marker traits.
//!
//! The transport and signing traits are bounded by these markers rather than
//! by `Send`/`Sync` directly, so the bounds can be relaxed in one place for
//! single-threaded targets.

pub use std::time::{Duration, SystemTime};

/// Marker trait for types that may be `Send`, depending on platform.
pub trait MaybeSend: Send {}
impl<T: Send> MaybeSend for T {}

/// Marker trait for types that may be `Send + Sync`, depending on platform.
pub trait MaybeSendSync: Send + Sync {}
impl<T: Send + Sync> MaybeSendSync for T {}
