//! Error types.

use thiserror::Error;

use crate::island::IslandId;

/// Errors reported while composing or configuring a hierarchical grid.
///
/// Runtime lookups on stale or unknown paths are not errors; they return
/// `None`/`false` and are logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// A size literal could not be parsed.
    #[error("Invalid size '{0}': expected '<n>px', '<n>%', 'auto' or 'null'")]
    InvalidSize(String),

    /// Two sibling row islands share the same key.
    #[error("Row island key '{key}' is already used by a sibling island")]
    DuplicateIslandKey {
        /// The conflicting key.
        key: String,
    },

    /// The referenced row island is not registered (never added or removed).
    #[error("Row island {0} not registered")]
    UnknownIsland(IslandId),

    /// The grid configuration could not be parsed.
    #[error("Invalid grid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Config(err.to_string())
    }
}
