//! Commit history: one JSON file per commit, listed newest first.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::disk::write_atomic;
use crate::error::{DatastoreError, Result};

const FILE_PREFIX: &str = "history.";

/// A single commit, with full before/after snapshots of the running config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub timestamp: DateTime<Utc>,
    pub client: String,
    pub comment: String,
    pub before: Json,
    pub after: Json,
}

impl CommitEntry {
    pub fn new(client: &str, comment: Option<&str>, before: Json, after: Json) -> Self {
        Self {
            timestamp: Utc::now(),
            client: client.to_string(),
            comment: comment
                .filter(|c| !c.is_empty())
                .unwrap_or("-")
                .to_string(),
            before,
            after,
        }
    }

    /// Nanoseconds since the epoch; also names the entry's file.
    pub fn id(&self) -> i64 {
        self.timestamp.timestamp_nanos_opt().unwrap_or_default()
    }

    fn file_name(&self) -> String {
        format!("{}{}.json", FILE_PREFIX, self.id())
    }
}

/// Append-only list of commits kept in a directory.
#[derive(Debug)]
pub struct CommitHistory {
    dir: PathBuf,
    entries: Vec<CommitEntry>,
}

impl CommitHistory {
    /// Open `dir`, creating it if needed, and read every history file in it.
    ///
    /// Files that cannot be read or decoded are skipped with a warning.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let io_error = |source| DatastoreError::Persistence {
            path: dir.clone(),
            source,
        };
        std::fs::create_dir_all(&dir).map_err(io_error)?;

        let mut entries = Vec::new();
        for item in std::fs::read_dir(&dir).map_err(io_error)? {
            let path = item.map_err(io_error)?.path();
            let is_history = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(".json"));
            if !is_history {
                continue;
            }
            match read_entry(&path) {
                Ok(entry) => entries.push(entry),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping commit history file"),
            }
        }
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        tracing::debug!(dir = %dir.display(), count = entries.len(), "loaded commit history");
        Ok(Self { dir, entries })
    }

    /// Make `entry` the newest and write its file.
    ///
    /// The entry stays in memory even when the write fails.
    pub fn append(&mut self, entry: CommitEntry) -> Result<()> {
        let path = self.dir.join(entry.file_name());
        let written = serde_json::to_string_pretty(&entry)
            .map_err(|source| DatastoreError::Json {
                path: path.clone(),
                source,
            })
            .and_then(|text| write_atomic(&path, &text));
        self.entries.insert(0, entry);
        written
    }

    /// Entry `idx`, where 0 is the most recent commit.
    pub fn get(&self, idx: usize) -> Result<&CommitEntry> {
        self.entries.get(idx).ok_or_else(|| {
            DatastoreError::state(format!(
                "invalid commit index {} ({} entries)",
                idx,
                self.entries.len()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommitEntry> {
        self.entries.iter()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Table of `Idx  ID  Timestamp  Client  Comment`, newest first.
    pub fn render_list(&self) -> String {
        let header = ["Idx", "ID", "Timestamp", "Client", "Comment"].map(String::from);
        let mut rows = vec![header.to_vec()];
        for (idx, entry) in self.entries.iter().enumerate() {
            rows.push(vec![
                idx.to_string(),
                entry.id().to_string(),
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.client.clone(),
                entry.comment.clone(),
            ]);
        }

        let mut widths = [0usize; 5];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }
        let mut out = String::new();
        for row in &rows {
            let cells: Vec<String> = row
                .iter()
                .zip(widths)
                .map(|(cell, w)| format!("{:<w$}", cell, w = w))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}

fn read_entry(path: &Path) -> Result<CommitEntry> {
    let text = std::fs::read_to_string(path).map_err(|source| DatastoreError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DatastoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
