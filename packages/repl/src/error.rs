//! Session startup and command failures.

use thiserror::Error;
use vtyang_completion::CompletionError;
use vtyang_config::ConfigError;
use vtyang_datastore::{BackendError, DatastoreError};
use vtyang_resolver::ResolveError;
use vtyang_schema::{SchemaError, ValidationError};

/// Failure to bring a session up.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    #[error("mgmtd: {0}")]
    Backend(#[from] BackendError),

    #[error("command tree: {0}")]
    Completion(#[from] CompletionError),
}

/// Failure of one command line. Only [`CommandError::is_fatal`] errors end
/// the session.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("% Invalid input detected")]
    Invalid,

    #[error("% Ambiguous command: {0}")]
    Ambiguous(String),

    #[error("Not Found")]
    NotFound,

    #[error("invalid commit index '{0}'")]
    Index(String),

    #[error("% '{0}' changes mode and cannot be run with 'do'")]
    DoModeChange(String),

    #[error("unknown rpc '{0}'")]
    UnknownRpc(String),

    #[error("rpc {rpc}: unknown input '{input}'")]
    UnknownInput { rpc: String, input: String },

    #[error("rpc {rpc}: input '{input}' requires a value")]
    MissingInput { rpc: String, input: String },

    #[error("rpc {0}: rpc execution is not supported by this agent")]
    RpcUnsupported(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    pub fn is_fatal(&self) -> bool {
        match self {
            CommandError::Config(e) => e.is_fatal(),
            CommandError::Datastore(e) => e.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors_are_fatal() {
        let err = CommandError::from(ConfigError::Structural {
            path: "/main:users".into(),
            expected: "container".into(),
            found: "leaf".into(),
        });
        assert!(err.is_fatal());
        assert!(!CommandError::NotFound.is_fatal());
    }

    #[test]
    fn display() {
        assert_eq!(CommandError::NotFound.to_string(), "Not Found");
        assert_eq!(
            CommandError::RpcUnsupported("reset-user".into()).to_string(),
            "rpc reset-user: rpc execution is not supported by this agent"
        );
    }
}
