//! # vtyang-repl
//!
//! An interactive, YANG-driven configuration shell.
//!
//! The shell loads compiled YANG modules, keeps a running configuration on
//! disk and lets the operator edit a candidate copy with `set`/`delete`,
//! then `commit` or `rollback` it. Every word is tab-completable from the
//! schema, including enum and identity values.
//!
//! ## Usage
//!
//! ```bash
//! vtyang --yang ./yang --run-path /var/run/vtyang
//!
//! # Inside the shell:
//! vtyang# configure
//! vtyang(config)# set users user hiroki age 34
//! vtyang(config)# commit
//! vtyang(config)# quit
//! vtyang# show running-config
//! ```

pub mod commands;
pub mod completer;
pub mod core;
pub mod error;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod session;

pub use crate::core::ReplCore;
pub use commands::{CommandResult, CommandTrees};
pub use error::{CommandError, SessionError};
pub use session::{Session, SessionConfig};
