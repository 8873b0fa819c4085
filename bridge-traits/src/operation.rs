//! Operation Catalog
//!
//! The closed set of store operations a backend can be asked to perform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A store operation delegated to a backend.
///
/// Used as the key of per-backend capability sets, as context in error
/// messages, and as the stable wire name when calling into an engine.
///
/// # Examples
///
/// ```
/// use bridge_traits::Operation;
///
/// assert_eq!(Operation::FetchBag.as_str(), "fetchBag");
/// assert_eq!(Operation::parse("listVersions"), Some(Operation::ListVersions));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Search,
    Lookup,
    FetchBag,
    Authenticate,
    RotatePasswordToken,
    Purchase,
    ListVersions,
    GetVersionMetadata,
    Download,
}

impl Operation {
    /// Every catalog member, in declaration order.
    pub const ALL: [Operation; 9] = [
        Operation::Search,
        Operation::Lookup,
        Operation::FetchBag,
        Operation::Authenticate,
        Operation::RotatePasswordToken,
        Operation::Purchase,
        Operation::ListVersions,
        Operation::GetVersionMetadata,
        Operation::Download,
    ];

    /// Stable wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Lookup => "lookup",
            Operation::FetchBag => "fetchBag",
            Operation::Authenticate => "authenticate",
            Operation::RotatePasswordToken => "rotatePasswordToken",
            Operation::Purchase => "purchase",
            Operation::ListVersions => "listVersions",
            Operation::GetVersionMetadata => "getVersionMetadata",
            Operation::Download => "download",
        }
    }

    /// Parse a wire name back into an operation.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
