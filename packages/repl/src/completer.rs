use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reedline::{Completer, Span, Suggestion};
use vtyang_completion::Completer as LineCompleter;
use vtyang_datastore::Mode;
use vtyang_schema::SchemaIndex;

use crate::commands::CommandTrees;

/// Tab completion for the line editor, backed by the session's command
/// trees.
///
/// The editor owns its completer, so the current mode is shared through a
/// flag the host updates whenever the prompt changes.
pub struct ReplCompleter {
    schema: Arc<SchemaIndex>,
    trees: Arc<CommandTrees>,
    configure: Arc<AtomicBool>,
}

impl ReplCompleter {
    pub fn new(schema: Arc<SchemaIndex>, trees: Arc<CommandTrees>) -> Self {
        Self {
            schema,
            trees,
            configure: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag selecting the configure-mode tree.
    pub fn mode_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.configure)
    }

    fn mode(&self) -> Mode {
        if self.configure.load(Ordering::Relaxed) {
            Mode::Configure
        } else {
            Mode::View
        }
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let tree = self.trees.for_mode(self.mode());
        let completion = LineCompleter::new(tree, &self.schema).complete(line, pos);

        completion
            .insertable()
            .map(|item| Suggestion {
                value: item.word.clone(),
                description: (!item.help.is_empty()).then(|| item.help.clone()),
                style: None,
                extra: None,
                span: Span::new(completion.start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}
