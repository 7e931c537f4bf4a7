//! Where the session loop meets the outside world.
//!
//! [`ReplCore`](crate::core::ReplCore) asks a host for one [`InputEvent`] at
//! a time and hands back [`Output`]s. A terminal, piped stdin and the
//! in-memory [`TestHost`] are interchangeable behind [`IoHost`].

pub mod test_host;
mod types;

pub use test_host::TestHost;
pub use types::*;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line editor: {0}")]
    Editor(String),
}

pub trait IoHost {
    /// Present `prompt` and block until the operator enters a line, presses
    /// Ctrl+C, or input ends.
    fn read_event(&mut self, prompt: &PromptConfig) -> Result<InputEvent, IoError>;

    fn write(&mut self, output: Output) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
