//! Datastore errors.

use std::path::PathBuf;

use vtyang_config::ConfigError;

use crate::backend::BackendError;

pub type Result<T> = std::result::Result<T, DatastoreError>;

#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    /// The operation does not apply in the current mode. Nothing changed.
    #[error("{0}")]
    State(String),

    #[error("failed to access {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("backend: {0}")]
    Backend(#[from] BackendError),
}

impl DatastoreError {
    pub(crate) fn state(message: impl Into<String>) -> Self {
        DatastoreError::State(message.into())
    }

    /// True when the tree and schema disagree; the session must not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DatastoreError::Config(e) if e.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_config_errors_are_fatal() {
        let err = DatastoreError::from(ConfigError::Structural {
            path: "/users".into(),
            expected: "list".into(),
            found: "container".into(),
        });
        assert!(err.is_fatal());
        assert!(!DatastoreError::state("no candidate").is_fatal());
    }

    #[test]
    fn persistence_error_names_file() {
        let err = DatastoreError::Persistence {
            path: PathBuf::from("/run/config.json"),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(
            err.to_string(),
            "failed to access /run/config.json: disk full"
        );
    }
}
