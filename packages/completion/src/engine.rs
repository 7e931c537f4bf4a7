//! Line completion over a [`CommandTree`].

use vtyang_resolver::{ResolveMode, Resolver};
use vtyang_schema::SchemaIndex;

use crate::node::{CompletionKind, CompletionNode};
use crate::tree::CommandTree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub word: String,
    pub help: String,
    /// `<cr>` or an unexpanded NAME/VALUE sentinel; nothing to insert.
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub items: Vec<CompletionItem>,
    /// Nothing in the tree matches the line.
    pub invalid: bool,
    /// Byte offset where the partial last word starts.
    pub start: usize,
}

impl Completion {
    /// Items that can be typed in place of the partial word.
    pub fn insertable(&self) -> impl Iterator<Item = &CompletionItem> {
        self.items.iter().filter(|item| !item.placeholder)
    }

    /// The `?` listing.
    pub fn render(&self) -> String {
        if self.invalid {
            return "% Invalid input detected".to_string();
        }
        let width = self.items.iter().map(|i| i.word.len()).max().unwrap_or(0);
        let mut out = String::from("Possible Completions:");
        for item in &self.items {
            let row = format!("  {:<width$}  {}", item.word, item.help);
            out.push('\n');
            out.push_str(row.trim_end());
        }
        out
    }
}

/// Completes lines against one mode's command tree.
#[derive(Debug, Clone, Copy)]
pub struct Completer<'a> {
    tree: &'a CommandTree,
    resolver: Resolver<'a>,
}

impl<'a> Completer<'a> {
    pub fn new(tree: &'a CommandTree, schema: &'a SchemaIndex) -> Self {
        Self {
            tree,
            resolver: Resolver::new(schema),
        }
    }

    /// Candidates for the word under the cursor.
    ///
    /// Every complete word before the cursor descends one level. NAME and
    /// VALUE positions are expanded into the values the schema enumerates
    /// for them, filtered by the partial word.
    pub fn complete(&self, line: &str, pos: usize) -> Completion {
        let head = line.get(..pos.min(line.len())).unwrap_or(line);
        let (words, partial, start) = split(head);

        let mut pivot = self.tree.root();
        let mut schema_from = None;
        for (i, word) in words.iter().enumerate() {
            let Some(next) = descend(pivot, word) else {
                tracing::debug!(line = head, word, "no completion for word");
                return Completion {
                    items: Vec::new(),
                    invalid: true,
                    start,
                };
            };
            if schema_from.is_none() && !next.modules.is_empty() {
                schema_from = Some(i);
            }
            pivot = next;
        }

        let mut items: Vec<CompletionItem> = Vec::new();
        for candidate in candidates(pivot, partial) {
            match candidate.kind {
                CompletionKind::Literal => items.push(word_item(&candidate.name, &candidate.description)),
                CompletionKind::Cr => items.push(placeholder(candidate)),
                CompletionKind::Name | CompletionKind::Value => {
                    let values = schema_from
                        .map(|from| self.enumerate(&words[from..], partial))
                        .unwrap_or_default();
                    if values.is_empty() {
                        items.push(placeholder(candidate));
                    }
                    for value in values {
                        items.push(word_item(&value, &candidate.description));
                    }
                }
            }
        }

        items.sort_by(|a, b| (a.word != "<cr>", &a.word).cmp(&(b.word != "<cr>", &b.word)));
        items.dedup_by(|a, b| a.word == b.word);
        Completion {
            invalid: items.is_empty(),
            items,
            start,
        }
    }

    fn enumerate(&self, tokens: &[&str], partial: &str) -> Vec<String> {
        let bt = self.resolver.resolve_backtracking(tokens, ResolveMode::Show);
        self.resolver.enumerate_values(&bt, partial)
    }
}

/// Complete words before the cursor, the partial word, and where it starts.
fn split(head: &str) -> (Vec<&str>, &str, usize) {
    let mut words: Vec<&str> = head.split_whitespace().collect();
    if head.is_empty() || head.ends_with(char::is_whitespace) {
        return (words, "", head.len());
    }
    let partial = words.pop().unwrap_or("");
    (words, partial, head.len() - partial.len())
}

fn candidates<'t>(pivot: &'t CompletionNode, word: &str) -> Vec<&'t CompletionNode> {
    let mut out: Vec<&CompletionNode> = pivot.children.iter().filter(|c| c.admits(word)).collect();
    if pivot.repeat && pivot.admits(word) {
        out.push(pivot);
    }
    out
}

/// An exact literal wins; otherwise the first candidate.
fn descend<'t>(pivot: &'t CompletionNode, word: &str) -> Option<&'t CompletionNode> {
    let candidates = candidates(pivot, word);
    let exact = candidates
        .iter()
        .find(|c| c.kind == CompletionKind::Literal && c.name == word)
        .copied();
    exact.or_else(|| candidates.first().copied())
}

fn word_item(word: &str, help: &str) -> CompletionItem {
    CompletionItem {
        word: word.to_string(),
        help: help.to_string(),
        placeholder: false,
    }
}

fn placeholder(node: &CompletionNode) -> CompletionItem {
    CompletionItem {
        word: node.name.clone(),
        help: node.description.clone(),
        placeholder: true,
    }
}
