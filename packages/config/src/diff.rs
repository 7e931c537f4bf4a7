//! Structural diff over the canonical JSON form of two trees.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value as Json;

use crate::node::ConfigNode;

/// What happened at one path.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added(Json),
    Removed(Json),
    Changed { from: Json, to: Json },
}

/// One difference between two documents.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    pub path: String,
    pub change: Change,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            Change::Added(value) => write!(f, "+ {}: {}", self.path, value),
            Change::Removed(value) => write!(f, "- {}: {}", self.path, value),
            Change::Changed { from, to } => {
                write!(f, "- {}: {}\n+ {}: {}", self.path, from, self.path, to)
            }
        }
    }
}

/// Differences that turn `before` into `after`. Empty means equal.
pub fn diff(before: &ConfigNode, after: &ConfigNode) -> Vec<DiffEntry> {
    diff_json(&before.to_json(), &after.to_json())
}

/// Same as [`diff`] over already-encoded documents. List elements are
/// compared by position.
pub fn diff_json(before: &Json, after: &Json) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    walk("", before, after, &mut out);
    out
}

/// One line per change, in path order.
pub fn render(entries: &[DiffEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn walk(path: &str, before: &Json, after: &Json, out: &mut Vec<DiffEntry>) {
    match (before, after) {
        (Json::Object(a), Json::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let child = format!("{}/{}", path, key);
                match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => walk(&child, x, y, out),
                    (Some(x), None) => out.push(DiffEntry {
                        path: child,
                        change: Change::Removed(x.clone()),
                    }),
                    (None, Some(y)) => out.push(DiffEntry {
                        path: child,
                        change: Change::Added(y.clone()),
                    }),
                    (None, None) => {}
                }
            }
        }
        (Json::Array(a), Json::Array(b)) => {
            for index in 0..a.len().max(b.len()) {
                let child = format!("{}[{}]", path, index);
                match (a.get(index), b.get(index)) {
                    (Some(x), Some(y)) => walk(&child, x, y, out),
                    (Some(x), None) => out.push(DiffEntry {
                        path: child,
                        change: Change::Removed(x.clone()),
                    }),
                    (None, Some(y)) => out.push(DiffEntry {
                        path: child,
                        change: Change::Added(y.clone()),
                    }),
                    (None, None) => {}
                }
            }
        }
        (x, y) if x == y => {}
        (x, y) => out.push(DiffEntry {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            change: Change::Changed {
                from: x.clone(),
                to: y.clone(),
            },
        }),
    }
}
