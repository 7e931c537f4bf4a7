//! Errors raised by tree operations and codecs.

use vtyang_schema::ValidationError;

/// Errors from reading, mutating or decoding a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: not found")]
    NotFound { path: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The tree disagrees with the path about a node's kind.
    #[error("structural error at {path}: expected {expected}, found {found}")]
    Structural {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path}: list requires values for keys [{}]", .keys.join(", "))]
    IncompleteKeys { path: String, keys: Vec<String> },

    #[error("{path}: value required")]
    MissingValue { path: String },

    /// Key leaves are fixed by the element's key tuple.
    #[error("{path}: list keys cannot be changed")]
    KeyLeaf { path: String },

    #[error("invalid JSON at {path}: {message}")]
    Json { path: String, message: String },

    #[error("unknown node '{name}' at {path}")]
    UnknownNode { path: String, name: String },
}

impl ConfigError {
    /// Structural errors mean the tree and schema disagree; callers must not
    /// keep operating on the tree.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConfigError::Structural { .. })
    }
}
