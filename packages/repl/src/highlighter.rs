use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};
use vtyang_completion::{CompletionKind, CompletionNode};
use vtyang_datastore::Mode;

use crate::commands::CommandTrees;

/// Colors each word by what it matches in the current mode's command tree:
/// command words, schema names, values, or nothing at all.
pub struct ReplHighlighter {
    trees: Arc<CommandTrees>,
    configure: Arc<AtomicBool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Command,
    Schema,
    Value,
    Unknown,
}

impl Role {
    fn of(node: &CompletionNode) -> Self {
        match node.kind {
            CompletionKind::Literal if node.modules.is_empty() => Role::Command,
            CompletionKind::Literal => Role::Schema,
            _ => Role::Value,
        }
    }

    fn style(self) -> Style {
        match self {
            Role::Command => Style::new().bold().fg(Color::Cyan),
            Role::Schema => Style::new(),
            Role::Value => Style::new().fg(Color::Yellow),
            Role::Unknown => Style::new().fg(Color::Red),
        }
    }
}

impl ReplHighlighter {
    /// `configure` is the same mode flag the completer follows.
    pub fn new(trees: Arc<CommandTrees>, configure: Arc<AtomicBool>) -> Self {
        Self { trees, configure }
    }

    fn mode(&self) -> Mode {
        if self.configure.load(Ordering::Relaxed) {
            Mode::Configure
        } else {
            Mode::View
        }
    }
}

/// Match `word` below `node` the way the dispatcher would, returning the
/// node to continue from.
fn classify<'t>(node: &'t CompletionNode, word: &str) -> (Role, Option<&'t CompletionNode>) {
    let literals = || {
        node.children
            .iter()
            .filter(|c| c.kind == CompletionKind::Literal)
    };
    if let Some(exact) = literals().find(|c| c.name == word) {
        return (Role::of(exact), Some(exact));
    }
    let mut commands = literals().filter(|c| c.modules.is_empty() && c.name.starts_with(word));
    if let (Some(only), None) = (commands.next(), commands.next()) {
        return (Role::Command, Some(only));
    }
    if let Some(wildcard) = node.children.iter().find(|c| c.is_wildcard()) {
        return (Role::Value, Some(wildcard));
    }
    if node.repeat && node.is_wildcard() {
        return (Role::Value, Some(node));
    }
    // Still being typed.
    if let Some(partial) = literals().find(|c| c.name.starts_with(word)) {
        return (Role::of(partial), None);
    }
    (Role::Unknown, None)
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        let mut node = Some(self.trees.for_mode(self.mode()).root());
        let mut rest = line;

        while !rest.is_empty() {
            let blank = rest.len() - rest.trim_start().len();
            if blank > 0 {
                styled.push((Style::new(), rest[..blank].to_string()));
                rest = &rest[blank..];
                continue;
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..end];
            let (role, next) = match node {
                Some(current) => classify(current, word),
                None => (Role::Unknown, None),
            };
            styled.push((role.style(), word.to_string()));
            node = next;
            rest = &rest[end..];
        }
        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtyang_schema::{SchemaEntry, SchemaIndex, SchemaModule, TypeDescriptor, TypeKind};

    fn highlighter(configure: bool) -> ReplHighlighter {
        let module = SchemaModule::new(
            "main",
            vec![SchemaEntry::container(
                "users",
                vec![SchemaEntry::list(
                    "user",
                    &["name"],
                    vec![
                        SchemaEntry::leaf("name", TypeDescriptor::new(TypeKind::String)),
                        SchemaEntry::leaf("age", TypeDescriptor::new(TypeKind::Uint8)),
                    ],
                )],
            )],
        );
        let schema = SchemaIndex::new(vec![module]).unwrap();
        let trees = Arc::new(CommandTrees::build(&schema).unwrap());
        ReplHighlighter::new(trees, Arc::new(AtomicBool::new(configure)))
    }

    /// Non-blank segments with their foreground color.
    fn words(styled: &StyledText) -> Vec<(&str, Option<Color>)> {
        styled
            .buffer
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(style, text)| (text.as_str(), style.foreground))
            .collect()
    }

    #[test]
    fn empty_line() {
        assert!(highlighter(false).highlight("", 0).buffer.is_empty());
    }

    #[test]
    fn full_and_abbreviated_commands() {
        let styled = highlighter(false).highlight("conf", 0);
        assert_eq!(words(&styled), vec![("conf", Some(Color::Cyan))]);

        let styled = highlighter(true).highlight("commit", 0);
        assert_eq!(words(&styled), vec![("commit", Some(Color::Cyan))]);
    }

    #[test]
    fn set_path_roles() {
        let styled = highlighter(true).highlight("set users user hiroki age 34", 0);
        assert_eq!(
            words(&styled),
            vec![
                ("set", Some(Color::Cyan)),
                ("users", None),
                ("user", None),
                ("hiroki", Some(Color::Yellow)),
                ("age", None),
                ("34", Some(Color::Yellow)),
            ]
        );
        let text: String = styled.buffer.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(text, "set users user hiroki age 34");
    }

    #[test]
    fn mode_decides_command_set() {
        let styled = highlighter(false).highlight("set users", 0);
        assert_eq!(
            words(&styled),
            vec![("set", Some(Color::Red)), ("users", Some(Color::Red))]
        );
    }

    #[test]
    fn partial_schema_word() {
        let styled = highlighter(true).highlight("set us", 0);
        assert_eq!(words(&styled)[1], ("us", None));
    }
}
