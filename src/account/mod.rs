//! The Community Solid Server account API.
//!
//! Account management is driven by control documents: the provider lists
//! the URL of every action available to the caller, and clients follow
//! those URLs rather than constructing paths themselves.

mod controls;
mod provision;
mod session;
mod webid;

pub(crate) use controls::require;
pub use controls::{
    AccountControls, AccountScopedControls, Controls, MissingControlError, PasswordControls,
};
pub use provision::{AccountDescriptor, CreateAccountError, NewAccount, create_account};
pub use session::SessionJar;
pub use webid::{WebIdLinks, WebIdSelectionError};
