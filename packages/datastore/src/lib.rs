//! Datastore Manager.
//!
//! Holds the committed running configuration and, while configuring, a
//! candidate copy. A commit persists running (write-then-rename), records
//! a history entry with before/after snapshots, optionally mirrors the
//! change onto a management daemon, and pushes the new running config to
//! subscribers, in that order.

pub mod backend;
mod broadcast;
mod datastore;
mod disk;
mod error;
#[cfg(test)]
mod fixtures;
mod history;

pub use backend::{Backend, BackendError, Edit, MgmtdClient};
pub use broadcast::Broadcaster;
pub use datastore::{Datastore, Mode, CONFIG_FILE, HISTORY_DIR};
pub use disk::RunningConfigFile;
pub use error::{DatastoreError, Result};
pub use history::{CommitEntry, CommitHistory};
