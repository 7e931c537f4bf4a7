//! The running/candidate pair and the commit workflow.

use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;

use tokio::sync::mpsc;
use vtyang_config::diff::{diff, diff_json, DiffEntry};
use vtyang_config::{ConfigNode, Path};
use vtyang_schema::SchemaIndex;

use crate::backend::{leaf_edits, Backend};
use crate::broadcast::Broadcaster;
use crate::disk::RunningConfigFile;
use crate::error::{DatastoreError, Result};
use crate::history::{CommitEntry, CommitHistory};

pub const CONFIG_FILE: &str = "config.json";
pub const HISTORY_DIR: &str = "history";

/// Whether a candidate exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Configure,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::View => "view",
            Mode::Configure => "configure",
        })
    }
}

/// Owns the committed running tree and, in configure mode, the candidate.
///
/// `set` and `delete` only ever touch the candidate; `commit` is the only way
/// running changes.
pub struct Datastore {
    schema: Arc<SchemaIndex>,
    running: ConfigNode,
    candidate: Option<ConfigNode>,
    history: CommitHistory,
    file: RunningConfigFile,
    backend: Option<Box<dyn Backend>>,
    broadcaster: Broadcaster,
}

impl Datastore {
    /// Open the runtime directory, creating it if missing, and load the
    /// running config and commit history from it.
    pub fn open(schema: Arc<SchemaIndex>, run_dir: &FsPath) -> Result<Self> {
        std::fs::create_dir_all(run_dir).map_err(|source| DatastoreError::Persistence {
            path: run_dir.to_path_buf(),
            source,
        })?;
        let file = RunningConfigFile::new(run_dir.join(CONFIG_FILE));
        let running = file.load(&schema)?;
        let history = CommitHistory::open(run_dir.join(HISTORY_DIR))?;
        tracing::info!(
            run_dir = %run_dir.display(),
            commits = history.len(),
            "datastore opened"
        );
        Ok(Self {
            schema,
            running,
            candidate: None,
            history,
            file,
            backend: None,
            broadcaster: Broadcaster::new(),
        })
    }

    /// Mirror every commit onto `backend`.
    pub fn with_backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn mode(&self) -> Mode {
        match self.candidate {
            Some(_) => Mode::Configure,
            None => Mode::View,
        }
    }

    pub fn running(&self) -> &ConfigNode {
        &self.running
    }

    pub fn candidate(&self) -> Option<&ConfigNode> {
        self.candidate.as_ref()
    }

    /// The candidate in configure mode, otherwise running.
    pub fn active(&self) -> &ConfigNode {
        self.candidate.as_ref().unwrap_or(&self.running)
    }

    pub fn configure(&mut self) -> Result<()> {
        if self.candidate.is_some() {
            return Err(DatastoreError::state("already in configure mode"));
        }
        self.candidate = Some(self.running.deep_copy());
        Ok(())
    }

    /// Drop the candidate. Returns false when there was none to drop.
    pub fn quit(&mut self) -> bool {
        self.candidate.take().is_some()
    }

    fn candidate_mut(&mut self) -> Result<&mut ConfigNode> {
        self.candidate
            .as_mut()
            .ok_or_else(|| DatastoreError::state("not in configure mode"))
    }

    pub fn set(&mut self, path: &Path, raw: Option<&str>) -> Result<()> {
        tracing::debug!(%path, raw, "set");
        Ok(self.candidate_mut()?.set(path, raw)?)
    }

    pub fn delete(&mut self, path: &Path) -> Result<()> {
        tracing::debug!(%path, "delete");
        Ok(self.candidate_mut()?.delete(path)?)
    }

    pub fn get_running(&self, path: &Path) -> Result<Option<&ConfigNode>> {
        Ok(self.running.get(path)?)
    }

    pub fn get_candidate(&self, path: &Path) -> Result<Option<&ConfigNode>> {
        let candidate = self
            .candidate
            .as_ref()
            .ok_or_else(|| DatastoreError::state("not in configure mode"))?;
        Ok(candidate.get(path)?)
    }

    /// Uncommitted changes: running against the candidate.
    pub fn diff(&self) -> Result<Vec<DiffEntry>> {
        let candidate = self
            .candidate
            .as_ref()
            .ok_or_else(|| DatastoreError::state("not in configure mode"))?;
        Ok(diff(&self.running, candidate))
    }

    /// Make the candidate the new running config.
    ///
    /// Running is persisted before anything else happens; if that fails the
    /// previous running config is restored. A backend failure is reported
    /// after the commit is recorded, since running is already durable.
    pub fn commit(&mut self, client: &str, comment: Option<&str>) -> Result<()> {
        let next = self
            .candidate
            .as_ref()
            .ok_or_else(|| DatastoreError::state("no candidate configuration to commit"))?
            .deep_copy();
        let previous = std::mem::replace(&mut self.running, next);
        if let Err(err) = self.file.store(&self.running) {
            tracing::error!(error = %err, "commit not persisted, running config restored");
            self.running = previous;
            return Err(err);
        }

        let mirrored = match self.backend.as_mut() {
            Some(backend) => {
                let edits = leaf_edits(&self.schema, &previous, &self.running);
                tracing::debug!(edits = edits.len(), "mirroring commit to backend");
                backend.apply(&edits)
            }
            None => Ok(()),
        };

        let entry = CommitEntry::new(client, comment, previous.to_json(), self.running.to_json());
        let id = entry.id();
        if let Err(err) = self.history.append(entry) {
            tracing::warn!(error = %err, "commit history entry not written");
        }
        self.broadcaster.publish(&self.running.to_json_string());
        tracing::info!(id, client, "committed");

        mirrored.map_err(DatastoreError::from)
    }

    /// Replace the candidate with the result of commit `idx` (0 is newest).
    /// Nothing changes until the next commit.
    pub fn rollback(&mut self, idx: usize) -> Result<()> {
        if self.candidate.is_none() {
            return Err(DatastoreError::state("not in configure mode"));
        }
        let entry = self.history.get(idx)?;
        let restored = ConfigNode::from_json_with_schema(&self.schema, &entry.after)?;
        tracing::info!(idx, id = entry.id(), "candidate rolled back");
        self.candidate = Some(restored);
        Ok(())
    }

    /// Persist running as is, without a history entry.
    pub fn write_memory(&self) -> Result<()> {
        self.file.store(&self.running)
    }

    pub fn history(&self) -> &CommitHistory {
        &self.history
    }

    /// Running against the result of commit `idx`.
    pub fn history_diff(&self, idx: usize) -> Result<Vec<DiffEntry>> {
        let entry = self.history.get(idx)?;
        Ok(diff_json(&self.running.to_json(), &entry.after))
    }

    /// What commit `idx` itself changed.
    pub fn commit_changes(&self, idx: usize) -> Result<Vec<DiffEntry>> {
        let entry = self.history.get(idx)?;
        Ok(diff_json(&entry.before, &entry.after))
    }

    /// Receive the running config now and after every commit.
    pub fn subscribe(&mut self) -> mpsc::Receiver<String> {
        self.broadcaster.subscribe(&self.running.to_json_string())
    }
}
