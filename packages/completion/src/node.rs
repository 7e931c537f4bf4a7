//! Completion trie nodes.

use std::cmp::Ordering;

use serde::Serialize;

pub const CR: &str = "<cr>";
pub const NAME: &str = "NAME";
pub const VALUE: &str = "VALUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// A fixed word: a command or a schema node name.
    Literal,
    /// Any list key value.
    Name,
    /// Any leaf value.
    Value,
    /// The command may end here.
    Cr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionNode {
    pub name: String,
    pub kind: CompletionKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Modules that contributed this node; empty for command words.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    /// A value position that may be repeated, as in a leaf-list.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub repeat: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CompletionNode>,
}

impl CompletionNode {
    fn new(name: &str, kind: CompletionKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            modules: Vec::new(),
            repeat: false,
            children: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new("", CompletionKind::Literal, "")
    }

    pub fn literal(name: &str, description: &str) -> Self {
        Self::new(name, CompletionKind::Literal, description)
    }

    pub fn name_wildcard(description: &str) -> Self {
        Self::new(NAME, CompletionKind::Name, description)
    }

    pub fn value(description: &str) -> Self {
        Self::new(VALUE, CompletionKind::Value, description)
    }

    pub fn cr() -> Self {
        Self::new(CR, CompletionKind::Cr, "")
    }

    pub fn with_module(mut self, module: &str) -> Self {
        if !module.is_empty() && !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
            self.modules.sort();
        }
        self
    }

    pub fn with_children(mut self, children: Vec<CompletionNode>) -> Self {
        for child in children {
            self.add_child(child);
        }
        self
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, CompletionKind::Name | CompletionKind::Value)
    }

    /// Whether `token` may be (the beginning of) this node.
    ///
    /// Wildcards admit anything; `<cr>` only an empty token.
    pub fn admits(&self, token: &str) -> bool {
        match self.kind {
            CompletionKind::Literal => self.name.starts_with(token),
            CompletionKind::Name | CompletionKind::Value => true,
            CompletionKind::Cr => token.is_empty(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&CompletionNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut CompletionNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Follow `words` by exact name.
    pub fn find(&self, words: &[&str]) -> Option<&CompletionNode> {
        match words.split_first() {
            None => Some(self),
            Some((first, rest)) => self.child(first)?.find(rest),
        }
    }

    pub fn find_mut(&mut self, words: &[&str]) -> Option<&mut CompletionNode> {
        match words.split_first() {
            None => Some(self),
            Some((first, rest)) => self.child_mut(first)?.find_mut(rest),
        }
    }

    /// Insert a child, merging with an existing child of the same name and
    /// kind.
    pub fn add_child(&mut self, child: CompletionNode) {
        match self
            .children
            .iter_mut()
            .find(|c| c.name == child.name && c.kind == child.kind)
        {
            Some(existing) => existing.merge(child),
            None => {
                let at = self
                    .children
                    .binary_search_by(|c| order(c, &child))
                    .unwrap_or_else(|i| i);
                self.children.insert(at, child);
            }
        }
    }

    /// Union `other` into this node: same-named children merge recursively,
    /// the rest are added. Contributing modules accumulate.
    pub fn merge(&mut self, other: CompletionNode) {
        if self.description.is_empty() {
            self.description = other.description;
        }
        for module in other.modules {
            if !self.modules.contains(&module) {
                self.modules.push(module);
            }
        }
        self.modules.sort();
        self.repeat |= other.repeat;
        for child in other.children {
            self.add_child(child);
        }
    }

    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CompletionNode::size).sum::<usize>()
    }
}

/// `<cr>` first, then by name.
fn order(a: &CompletionNode, b: &CompletionNode) -> Ordering {
    let rank = |n: &CompletionNode| n.kind != CompletionKind::Cr;
    rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
}
