//! Command tables and dispatch for the two CLI modes.
//!
//! View mode:
//! - `configure`, `write memory`, `quit`
//! - `show running-config [path]`, `show running-config-frr`, `show running-config-raw`
//! - `show configuration commit list [idx]`, `show configuration commit diff <idx>`
//! - `show yang modules`, `show cli-tree`, `show <state path>`
//! - `show-xpath <tokens>`, `eval-xpath <bracketed path>`, `rpc <name> [input value]...`
//!
//! Configure mode:
//! - `set <path> <value>`, `delete <path>`
//! - `commit [comment <text>]`, `rollback configuration <idx>`
//! - `show configuration [running|candidate|diff]`, `show configuration commit ...`
//! - `do <view command>`, `quit` (back to view mode)
//!
//! Both modes accept `help`, `list`, `exit` and a trailing `?` for the
//! completions of the line before it. Command words may be abbreviated to
//! any unique prefix.

use std::sync::Arc;

use vtyang_completion::{build, CommandTree, CompletionError, CompletionKind, CompletionNode, Family};
use vtyang_config::diff::{render, DiffEntry};
use vtyang_config::ConfigNode;
use vtyang_datastore::Mode;
use vtyang_resolver::{ResolveMode, Resolver};
use vtyang_schema::{validate, SchemaIndex};

use crate::error::CommandError;
use crate::session::Session;

/// Client name recorded in commit history.
pub const CLIENT: &str = "cli";

type Command = &'static [(&'static str, &'static str)];

const COMMON: &[Command] = &[
    &[("help", "Show available commands")],
    &[("list", "List every command line")],
    &[("quit", "Leave the current mode")],
    &[("exit", "Leave the current mode")],
    &[("show", "Show information"), ("cli-tree", "Dump the completion tree as JSON")],
];

const HISTORY: &[Command] = &[&[
    ("show", ""),
    ("configuration", "Configuration state"),
    ("commit", "Commit history"),
    ("list", "List commits, or the changes of one"),
]];

const HISTORY_DIFF: Command = &[
    ("show", ""),
    ("configuration", ""),
    ("commit", ""),
    ("diff", "Compare running with a commit"),
];

const VIEW: &[Command] = &[
    &[("configure", "Enter configuration mode")],
    &[("show", ""), ("running-config", "Running configuration")],
    &[("show", ""), ("running-config-frr", "Running configuration with module-qualified names")],
    &[("show", ""), ("running-config-raw", "Running configuration as compact JSON")],
    &[("show", ""), ("yang", "YANG information"), ("modules", "Loaded modules")],
    &[("write", "Persist state"), ("memory", "Write the running config to disk")],
];

const CONFIGURE: &[Command] = &[
    &[("commit", "Commit the candidate")],
    &[("show", ""), ("configuration", "Candidate configuration")],
    &[("show", ""), ("configuration", ""), ("running", "Running configuration")],
    &[("show", ""), ("configuration", ""), ("candidate", "Candidate configuration")],
    &[("show", ""), ("configuration", ""), ("diff", "Changes from running to candidate")],
];

/// Command trees for both modes, built once per schema.
#[derive(Debug, Clone)]
pub struct CommandTrees {
    pub view: CommandTree,
    pub configure: CommandTree,
}

impl CommandTrees {
    pub fn build(schema: &SchemaIndex) -> Result<Self, CompletionError> {
        let index = || vec![CompletionNode::value("commit index").with_children(vec![CompletionNode::cr()])];

        let mut view = CommandTree::new();
        for command in COMMON.iter().chain(HISTORY).chain(VIEW) {
            view.install(command)?;
        }
        view.attach(&["show", "configuration", "commit", "list"], index())?;
        view.install_with(&[("show", "")], build(schema, Family::Operational))?;
        view.attach(&["show", "running-config"], build(schema, Family::View))?;
        view.install_with(
            &[("show-xpath", "Print the path the tokens resolve to")],
            build(schema, Family::View),
        )?;
        view.install_with(&[("eval-xpath", "Print the node at a bracketed path")], {
            vec![CompletionNode::value("/module:name[key='value']").with_children(vec![CompletionNode::cr()])]
        })?;
        view.install_with(&[("rpc", "Invoke an rpc")], build(schema, Family::Rpc))?;
        view.install_with(HISTORY_DIFF, index())?;

        let mut configure = CommandTree::new();
        for command in COMMON.iter().chain(HISTORY).chain(CONFIGURE) {
            configure.install(command)?;
        }
        configure.attach(&["show", "configuration", "commit", "list"], index())?;
        configure.install_with(HISTORY_DIFF, index())?;
        configure.install_with(&[("set", "Set a value in the candidate")], build(schema, Family::Config))?;
        configure.install_with(&[("delete", "Delete a node from the candidate")], build(schema, Family::View))?;
        configure.install_with(
            &[("commit", ""), ("comment", "Record a comment with the commit")],
            vec![CompletionNode::value("text").repeating().with_children(vec![CompletionNode::cr()])],
        )?;
        configure.install_with(
            &[("rollback", "Restore an earlier configuration"), ("configuration", "Candidate from commit history")],
            index(),
        )?;
        configure.install_with(&[("do", "Run a view mode command")], view.root().children.clone())?;

        Ok(Self { view, configure })
    }

    pub fn for_mode(&self, mode: Mode) -> &CommandTree {
        match mode {
            Mode::View => &self.view,
            Mode::Configure => &self.configure,
        }
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command succeeded, optionally with output to display
    Ok { display: Option<String> },
    /// Command failed; the session continues
    Error(String),
    /// The tree and schema disagree; the session must end
    Fatal(String),
    /// User asked to leave the shell
    Exit,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok { display: None }
    }

    pub fn display(&self) -> Option<&str> {
        match self {
            CommandResult::Ok { display } => display.as_deref(),
            _ => None,
        }
    }
}

/// Parse and execute one command line in the session's current mode.
pub fn execute(input: &str, session: &mut Session) -> CommandResult {
    let input = input.trim();
    if input.is_empty() || input.starts_with('!') {
        return CommandResult::ok_none();
    }
    if let Some(head) = input.strip_suffix('?') {
        return CommandResult::ok_display(session.complete(head, head.len()).render());
    }

    let result = expand(session.tree(), input).and_then(|words| {
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        tracing::debug!(mode = %session.mode(), ?words, "execute");
        match session.mode() {
            Mode::View => view(&words, session),
            Mode::Configure => configure(&words, session),
        }
    });
    match result {
        Ok(result) => result,
        Err(err) if err.is_fatal() => {
            tracing::error!(error = %err, "fatal error, ending session");
            CommandResult::Fatal(err.to_string())
        }
        Err(err) => CommandResult::Error(err.to_string()),
    }
}

/// Replace abbreviated command words by their full names.
///
/// Expansion stops at the first word that is not a command word, so schema
/// names and values pass through untouched.
fn expand(tree: &CommandTree, input: &str) -> Result<Vec<String>, CommandError> {
    let mut node = tree.root();
    let mut out = Vec::new();
    let mut words = input.split_whitespace();
    for word in words.by_ref() {
        let is_schema_name = node
            .children
            .iter()
            .any(|c| !c.modules.is_empty() && c.name == word);
        let commands: Vec<&CompletionNode> = node
            .children
            .iter()
            .filter(|c| c.kind == CompletionKind::Literal && c.modules.is_empty())
            .collect();
        let matched = match commands.iter().find(|c| c.name == word) {
            Some(exact) => Some(*exact),
            None if is_schema_name => None,
            None => {
                let prefixed: Vec<&CompletionNode> = commands
                    .iter()
                    .copied()
                    .filter(|c| c.name.starts_with(word))
                    .collect();
                match prefixed.as_slice() {
                    [] => None,
                    [only] => Some(*only),
                    _ => return Err(CommandError::Ambiguous(word.to_string())),
                }
            }
        };
        match matched {
            Some(command) => {
                out.push(command.name.clone());
                node = command;
            }
            None => {
                out.push(word.to_string());
                break;
            }
        }
    }
    out.extend(words.map(str::to_string));
    Ok(out)
}

fn view(words: &[&str], session: &mut Session) -> Result<CommandResult, CommandError> {
    let schema = Arc::clone(session.schema());
    let resolver = Resolver::new(&schema);
    let datastore = session.datastore();

    match words {
        ["configure"] => {
            session.datastore_mut().configure()?;
            Ok(CommandResult::ok_none())
        }
        ["show", "running-config", path @ ..] => show_node(&resolver, datastore.running(), path),
        ["show", "running-config-frr"] => Ok(CommandResult::ok_display(
            datastore.running().qualify_top_level(&schema).to_json_string(),
        )),
        ["show", "running-config-raw"] => Ok(CommandResult::ok_display(serde_json::to_string(
            &datastore.running().to_json(),
        )?)),
        ["show", "configuration", "commit", rest @ ..] => commit_history(session, rest),
        ["show", "yang", "modules"] => Ok(CommandResult::ok_display(render_modules(&schema))),
        ["show", "cli-tree"] => Ok(CommandResult::ok_display(session.tree().to_json_string()?)),
        ["show", path @ ..] if !path.is_empty() => show_node(&resolver, datastore.running(), path),
        ["show-xpath", path @ ..] => {
            let resolved = resolver.resolve_tokens(path, ResolveMode::Show)?;
            Ok(CommandResult::ok_display(resolved.path.to_string()))
        }
        ["eval-xpath", xpath] => {
            let path = resolver.resolve_str(xpath)?;
            match datastore.active().get(&path)? {
                Some(node) => Ok(CommandResult::ok_display(node.to_json_string())),
                None => Err(CommandError::NotFound),
            }
        }
        ["write", "memory"] => {
            datastore.write_memory()?;
            Ok(CommandResult::ok_none())
        }
        ["rpc", name, inputs @ ..] => rpc(&schema, name, inputs),
        ["list"] => Ok(CommandResult::ok_display(session.tree().lines().join("\n"))),
        ["help"] => Ok(CommandResult::ok_display(help(session.tree()))),
        ["quit"] | ["exit"] => Ok(CommandResult::Exit),
        _ => Err(CommandError::Invalid),
    }
}

fn configure(words: &[&str], session: &mut Session) -> Result<CommandResult, CommandError> {
    let schema = Arc::clone(session.schema());
    let resolver = Resolver::new(&schema);

    match words {
        ["set", path @ ..] if !path.is_empty() => {
            let resolved = resolver.resolve_tokens(path, ResolveMode::Set)?;
            session
                .datastore_mut()
                .set(&resolved.path, resolved.value.as_deref())?;
            Ok(CommandResult::ok_none())
        }
        ["delete", path @ ..] if !path.is_empty() => {
            let resolved = resolver.resolve_tokens(path, ResolveMode::Show)?;
            session.datastore_mut().delete(&resolved.path)?;
            Ok(CommandResult::ok_none())
        }
        ["commit"] => {
            session.datastore_mut().commit(CLIENT, None)?;
            Ok(CommandResult::ok_none())
        }
        ["commit", "comment", text @ ..] if !text.is_empty() => {
            session
                .datastore_mut()
                .commit(CLIENT, Some(&text.join(" ")))?;
            Ok(CommandResult::ok_none())
        }
        ["rollback", "configuration", idx] => {
            session.datastore_mut().rollback(parse_index(idx)?)?;
            Ok(CommandResult::ok_none())
        }
        ["show", "configuration"] | ["show", "configuration", "candidate"] => Ok(
            CommandResult::ok_display(session.datastore().active().to_json_string()),
        ),
        ["show", "configuration", "running"] => Ok(CommandResult::ok_display(
            session.datastore().running().to_json_string(),
        )),
        ["show", "configuration", "diff"] => Ok(render_diff(&session.datastore().diff()?)),
        ["show", "configuration", "commit", rest @ ..] => commit_history(session, rest),
        ["show", "cli-tree"] => Ok(CommandResult::ok_display(session.tree().to_json_string()?)),
        ["do", first, ..] if ["configure", "quit", "exit"].contains(first) => {
            Err(CommandError::DoModeChange(first.to_string()))
        }
        ["do", rest @ ..] if !rest.is_empty() => view(rest, session),
        ["list"] => Ok(CommandResult::ok_display(session.tree().lines().join("\n"))),
        ["help"] => Ok(CommandResult::ok_display(help(session.tree()))),
        ["quit"] | ["exit"] => {
            session.datastore_mut().quit();
            Ok(CommandResult::ok_none())
        }
        _ => Err(CommandError::Invalid),
    }
}

fn show_node(
    resolver: &Resolver<'_>,
    tree: &ConfigNode,
    tokens: &[&str],
) -> Result<CommandResult, CommandError> {
    if tokens.is_empty() {
        return Ok(CommandResult::ok_display(tree.to_json_string()));
    }
    let resolved = resolver.resolve_tokens(tokens, ResolveMode::Show)?;
    match tree.get(&resolved.path)? {
        Some(node) => Ok(CommandResult::ok_display(node.to_json_string())),
        None => Err(CommandError::NotFound),
    }
}

fn commit_history(session: &Session, rest: &[&str]) -> Result<CommandResult, CommandError> {
    let datastore = session.datastore();
    match rest {
        ["list"] => Ok(CommandResult::ok_display(datastore.history().render_list())),
        ["list", idx] => Ok(render_diff(&datastore.commit_changes(parse_index(idx)?)?)),
        ["diff", idx] => Ok(render_diff(&datastore.history_diff(parse_index(idx)?)?)),
        _ => Err(CommandError::Invalid),
    }
}

fn parse_index(idx: &str) -> Result<usize, CommandError> {
    idx.parse().map_err(|_| CommandError::Index(idx.to_string()))
}

fn render_diff(entries: &[DiffEntry]) -> CommandResult {
    if entries.is_empty() {
        CommandResult::ok_none()
    } else {
        CommandResult::ok_display(render(entries))
    }
}

/// Check rpc inputs against the schema, then refuse to run it.
fn rpc(schema: &SchemaIndex, name: &str, inputs: &[&str]) -> Result<CommandResult, CommandError> {
    let rpc = schema
        .find_rpc(name)
        .ok_or_else(|| CommandError::UnknownRpc(name.to_string()))?;
    for pair in inputs.chunks(2) {
        let input = pair[0];
        let entry = rpc
            .find_child(input)
            .ok_or_else(|| CommandError::UnknownInput {
                rpc: name.to_string(),
                input: input.to_string(),
            })?;
        let (Some(value), Some(ty)) = (pair.get(1), entry.ty()) else {
            return Err(CommandError::MissingInput {
                rpc: name.to_string(),
                input: input.to_string(),
            });
        };
        validate(ty, value)?;
    }
    Err(CommandError::RpcUnsupported(name.to_string()))
}

fn render_modules(schema: &SchemaIndex) -> String {
    let width = schema
        .modules()
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0)
        .max("Module".len());
    let mut out = format!("{:<width$}  Entries", "Module");
    for module in schema.modules() {
        out.push_str(&format!("\n{:<width$}  {}", module.name, module.entries.len()));
    }
    out
}

fn help(tree: &CommandTree) -> String {
    let commands = &tree.root().children;
    let width = commands.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let mut out = String::from("Commands:");
    for command in commands {
        let row = format!("  {:<width$}  {}", command.name, command.description);
        out.push('\n');
        out.push_str(row.trim_end());
    }
    out
}
