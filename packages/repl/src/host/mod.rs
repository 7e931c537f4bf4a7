//! Host implementations for the REPL.
//!
//! The terminal host uses Reedline for interactive terminal I/O; the stdio
//! host serves scripts piped into the shell.

pub mod stdio;
pub mod terminal;

pub use stdio::StdioHost;
pub use terminal::TerminalHost;
