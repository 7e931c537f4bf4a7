//! Resolution failures.

use vtyang_schema::ValidationError;

/// Why a path could not be resolved. None of these mutate anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{path}: '{name}' not found")]
    NotFound { path: String, name: String },

    #[error("{path}: {source}")]
    Validation {
        path: String,
        #[source]
        source: ValidationError,
    },

    #[error("{path}: value required")]
    MissingValue { path: String },

    #[error("{path}: unexpected token '{token}'")]
    UnexpectedToken { path: String, token: String },

    #[error("{path}: '{name}' is read-only")]
    ReadOnly { path: String, name: String },

    #[error("invalid path syntax at '{segment}'")]
    Syntax { segment: String },

    #[error("{path}: missing key '{key}'")]
    MissingKey { path: String, key: String },

    #[error("{path}: '{key}' is not a key")]
    UnknownKey { path: String, key: String },

    #[error("{path}: list keys cannot be set directly")]
    KeyLeaf { path: String },
}
