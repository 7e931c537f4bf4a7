//! One shell session: the loaded schema, the datastore and the command trees.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vtyang_completion::{CommandTree, Completer, Completion};
use vtyang_datastore::{Datastore, Mode};
use vtyang_schema::SchemaIndex;

use crate::commands::{self, CommandResult, CommandTrees};
use crate::error::SessionError;
use crate::io::PromptConfig;

/// Name the shell registers under with the management daemon.
pub const MGMTD_CLIENT_NAME: &str = "vtyang";

/// Where a session loads its state from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directories of compiled module JSON files.
    pub yang_dirs: Vec<PathBuf>,
    /// Holds the running config and the commit history.
    pub run_dir: PathBuf,
    /// Front-end socket of the management daemon, if commits are mirrored.
    pub mgmtd: Option<PathBuf>,
    pub hostname: String,
}

impl SessionConfig {
    pub fn new(yang_dirs: Vec<PathBuf>, run_dir: PathBuf) -> Self {
        Self {
            yang_dirs,
            run_dir,
            mgmtd: None,
            hostname: "vtyang".to_string(),
        }
    }
}

#[cfg(unix)]
fn connect_mgmtd(datastore: Datastore, socket: &Path) -> Result<Datastore, SessionError> {
    let client = vtyang_datastore::MgmtdClient::connect(socket, MGMTD_CLIENT_NAME)?;
    Ok(datastore.with_backend(Box::new(client)))
}

#[cfg(not(unix))]
fn connect_mgmtd(_datastore: Datastore, socket: &Path) -> Result<Datastore, SessionError> {
    let err = std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("{}: unix sockets are not available", socket.display()),
    );
    Err(SessionError::Backend(err.into()))
}

pub struct Session {
    schema: Arc<SchemaIndex>,
    datastore: Datastore,
    trees: Arc<CommandTrees>,
    hostname: String,
}

impl Session {
    /// Load the schema, open the datastore and, if configured, connect the
    /// management daemon.
    pub fn open(config: &SessionConfig) -> Result<Self, SessionError> {
        let schema = Arc::new(SchemaIndex::load(&config.yang_dirs)?);
        let mut datastore = Datastore::open(Arc::clone(&schema), &config.run_dir)?;
        if let Some(socket) = &config.mgmtd {
            datastore = connect_mgmtd(datastore, socket)?;
        }
        let mut session = Self::new(schema, datastore)?;
        session.hostname = config.hostname.clone();
        Ok(session)
    }

    pub fn new(schema: Arc<SchemaIndex>, datastore: Datastore) -> Result<Self, SessionError> {
        let trees = Arc::new(CommandTrees::build(&schema)?);
        tracing::debug!(
            view = trees.view.root().size(),
            configure = trees.configure.root().size(),
            "command trees built"
        );
        Ok(Self {
            schema,
            datastore,
            trees,
            hostname: "vtyang".to_string(),
        })
    }

    pub fn schema(&self) -> &Arc<SchemaIndex> {
        &self.schema
    }

    pub fn datastore(&self) -> &Datastore {
        &self.datastore
    }

    pub fn datastore_mut(&mut self) -> &mut Datastore {
        &mut self.datastore
    }

    pub fn trees(&self) -> &Arc<CommandTrees> {
        &self.trees
    }

    pub fn mode(&self) -> Mode {
        self.datastore.mode()
    }

    /// Command tree of the current mode.
    pub fn tree(&self) -> &CommandTree {
        self.trees.for_mode(self.mode())
    }

    pub fn prompt(&self) -> PromptConfig {
        PromptConfig {
            hostname: self.hostname.clone(),
            configure: self.mode() == Mode::Configure,
        }
    }

    pub fn execute(&mut self, line: &str) -> CommandResult {
        commands::execute(line, self)
    }

    pub fn complete(&self, line: &str, pos: usize) -> Completion {
        Completer::new(self.tree(), &self.schema).complete(line, pos)
    }
}
