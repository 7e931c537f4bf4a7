//! The running-config file.

use std::io::Write;
use std::path::{Path, PathBuf};

use vtyang_config::ConfigNode;
use vtyang_schema::SchemaIndex;

use crate::error::{DatastoreError, Result};

/// Replace `path` with `contents` by writing a sibling temporary file and
/// renaming it over the target.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let io_error = |source| DatastoreError::Persistence {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(contents.as_bytes()).map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Location of the persisted running configuration.
#[derive(Debug, Clone)]
pub struct RunningConfigFile {
    path: PathBuf,
}

impl RunningConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the file. A missing file is an empty configuration.
    pub fn load(&self, schema: &SchemaIndex) -> Result<ConfigNode> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no running-config file, starting empty");
                return Ok(ConfigNode::root());
            }
            Err(source) => {
                return Err(DatastoreError::Persistence {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| DatastoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(ConfigNode::from_json_with_schema(schema, &json)?)
    }

    pub fn store(&self, node: &ConfigNode) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "writing running-config");
        write_atomic(&self.path, &node.to_json_string())
    }
}
