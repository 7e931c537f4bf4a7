//! The per-mode command trie: fixed command words with schema families
//! grafted underneath.

use serde::Serialize;

use crate::error::CompletionError;
use crate::node::{CompletionKind, CompletionNode};

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CommandTree {
    root: CompletionNode,
}

impl CommandTree {
    pub fn new() -> Self {
        Self {
            root: CompletionNode::root(),
        }
    }

    pub fn root(&self) -> &CompletionNode {
        &self.root
    }

    /// Install a fixed command given as `(word, help)` pairs. The last word
    /// may end the line.
    pub fn install(&mut self, words: &[(&str, &str)]) -> Result<(), CompletionError> {
        self.install_with(words, vec![CompletionNode::cr()])
    }

    /// Install a fixed command whose last word is followed by `tail`
    /// instead of `<cr>`.
    pub fn install_with(
        &mut self,
        words: &[(&str, &str)],
        tail: Vec<CompletionNode>,
    ) -> Result<(), CompletionError> {
        let ((last, last_help), prefix) = words.split_last().ok_or(CompletionError::EmptyCommand)?;
        let node = prefix.iter().rev().fold(
            CompletionNode::literal(last, last_help).with_children(tail),
            |child, (word, help)| CompletionNode::literal(word, help).with_children(vec![child]),
        );
        self.root.add_child(node);
        Ok(())
    }

    /// Graft `nodes` under the installed command `words`.
    pub fn attach(&mut self, words: &[&str], nodes: Vec<CompletionNode>) -> Result<(), CompletionError> {
        let target = self
            .root
            .find_mut(words)
            .ok_or_else(|| CompletionError::NotInstalled(words.join(" ")))?;
        for node in nodes {
            target.add_child(node);
        }
        Ok(())
    }

    pub fn find(&self, words: &[&str]) -> Option<&CompletionNode> {
        self.root.find(words)
    }

    /// Every complete command line the tree accepts, wildcards shown by
    /// their sentinel names.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut words = Vec::new();
        collect_lines(&self.root, &mut words, &mut out);
        out
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_lines<'a>(node: &'a CompletionNode, words: &mut Vec<&'a str>, out: &mut Vec<String>) {
    for child in &node.children {
        if child.kind == CompletionKind::Cr {
            out.push(words.join(" "));
            continue;
        }
        words.push(&child.name);
        collect_lines(child, words, out);
        words.pop();
    }
}
