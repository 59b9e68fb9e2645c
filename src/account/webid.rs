use std::collections::BTreeMap;

use serde::Deserialize;
use snafu::prelude::*;

/// The WebID listing of an account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebIdLinks {
    /// Linked WebIDs mapped to the resource describing each link.
    #[serde(default)]
    pub web_id_links: BTreeMap<String, String>,
}

impl WebIdLinks {
    /// Chooses the WebID to mint credentials for.
    ///
    /// A requested WebID must be linked. Without a request, the only linked
    /// WebID is chosen.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested WebID is not linked, no WebID is
    /// linked, or several are linked and none was requested.
    pub fn select(&self, requested: Option<&str>) -> Result<String, WebIdSelectionError> {
        if let Some(requested) = requested {
            ensure!(
                self.web_id_links.contains_key(requested),
                WebIdNotLinkedSnafu {
                    requested,
                    linked: self.candidates(),
                }
            );
            return Ok(requested.to_owned());
        }

        let mut linked = self.web_id_links.keys();
        match (linked.next(), linked.next()) {
            (None, _) => NoLinkedWebIdSnafu.fail(),
            (Some(only), None) => Ok(only.clone()),
            (Some(_), Some(_)) => AmbiguousWebIdSnafu {
                candidates: self.candidates(),
            }
            .fail(),
        }
    }

    fn candidates(&self) -> Vec<String> {
        self.web_id_links.keys().cloned().collect()
    }
}

/// No single WebID could be chosen for the credentials.
#[derive(Debug, Snafu)]
pub enum WebIdSelectionError {
    /// The requested WebID is not linked to the account.
    #[snafu(display("WebID '{requested}' is not linked to this account (linked: {linked:?})"))]
    WebIdNotLinked {
        /// The WebID that was asked for.
        requested: String,
        /// The WebIDs that are linked.
        linked: Vec<String>,
    },
    /// The account has no linked WebID.
    #[snafu(display("No WebID is linked to this account"))]
    NoLinkedWebId,
    /// Several WebIDs are linked and none was requested.
    #[snafu(display("Several WebIDs are linked to this account, choose one of {candidates:?}"))]
    AmbiguousWebId {
        /// The linked WebIDs, in lexicographic order.
        candidates: Vec<String>,
    },
}

impl crate::Error for WebIdSelectionError {
    fn is_retryable(&self) -> bool {
        false
    }
}
