use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("command not installed: {0}")]
    NotInstalled(String),

    #[error("cannot install an empty command")]
    EmptyCommand,
}
