//! Mirroring commits onto an external management daemon.

mod frame;
pub mod mgmtd;

use std::collections::BTreeMap;

use vtyang_config::{ConfigNode, NodeData};
use vtyang_schema::{SchemaEntry, SchemaIndex};

pub use frame::{encode_frame, Frame, FrameDecoder, HEADER_LEN, MARKER_NATIVE, MARKER_PROTOBUF};
pub use mgmtd::MgmtdClient;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown frame marker {0:#010x}")]
    Marker(u32),

    #[error("invalid frame length {0}")]
    Length(u32),

    #[error("undecodable message: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("{operation} rejected: {message}")]
    Rejected { operation: String, message: String },

    #[error("unexpected reply to {operation}")]
    UnexpectedReply { operation: String },
}

/// One change to push to the daemon, addressed by xpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Create or update. List entries and presence nodes carry no value.
    Set { xpath: String, value: Option<String> },
    Delete { xpath: String },
}

/// A daemon that accepts candidate edits and commits them.
pub trait Backend {
    fn lock(&mut self) -> Result<(), BackendError>;
    fn unlock(&mut self) -> Result<(), BackendError>;
    fn set(&mut self, xpath: &str, value: Option<&str>) -> Result<(), BackendError>;
    fn delete(&mut self, xpath: &str) -> Result<(), BackendError>;
    fn commit(&mut self) -> Result<(), BackendError>;

    /// Lock, apply every edit, commit and unlock.
    ///
    /// The lock is released even when an edit or the commit fails.
    fn apply(&mut self, edits: &[Edit]) -> Result<(), BackendError> {
        self.lock()?;
        let result = edits
            .iter()
            .try_for_each(|edit| match edit {
                Edit::Set { xpath, value } => self.set(xpath, value.as_deref()),
                Edit::Delete { xpath } => self.delete(xpath),
            })
            .and_then(|()| self.commit());
        let unlocked = self.unlock();
        result.and(unlocked)
    }
}

/// Edits turning `before` into `after`: deletes first, then sets, each in
/// xpath order.
pub fn leaf_edits(schema: &SchemaIndex, before: &ConfigNode, after: &ConfigNode) -> Vec<Edit> {
    let old = flatten(schema, before);
    let new = flatten(schema, after);

    let removed: Vec<&String> = old.keys().filter(|x| !new.contains_key(*x)).collect();
    // A removed list entry already takes everything beneath it.
    let mut edits: Vec<Edit> = removed
        .iter()
        .filter(|xpath| !removed.iter().any(|parent| is_beneath(xpath, parent)))
        .map(|xpath| Edit::Delete {
            xpath: xpath.to_string(),
        })
        .collect();
    for (xpath, value) in &new {
        if old.get(xpath) != Some(value) {
            edits.push(Edit::Set {
                xpath: xpath.clone(),
                value: value.clone(),
            });
        }
    }
    edits
}

fn is_beneath(xpath: &str, parent: &str) -> bool {
    xpath
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Every list entry and leaf of `root` keyed by its xpath.
fn flatten(schema: &SchemaIndex, root: &ConfigNode) -> BTreeMap<String, Option<String>> {
    let mut out = BTreeMap::new();
    for child in root.children() {
        let tops = schema.find_tops(&child.name);
        let Some(first) = tops.first() else {
            tracing::warn!(name = %child.name, "no schema entry, not mirrored");
            continue;
        };
        let xpath = format!("/{}:{}", first.module, first.name);
        match &child.data {
            NodeData::Container(children) if tops.len() > 1 => {
                flatten_children(&tops, children, &xpath, &mut out)
            }
            _ => flatten_node(first, child, &xpath, &mut out),
        }
    }
    out
}

fn flatten_node(
    entry: &SchemaEntry,
    node: &ConfigNode,
    xpath: &str,
    out: &mut BTreeMap<String, Option<String>>,
) {
    match &node.data {
        NodeData::Container(children) => flatten_children(&[entry], children, xpath, out),
        NodeData::List(elements) => {
            for element in elements {
                let mut item = xpath.to_string();
                for key in entry.keys() {
                    let value = element
                        .child(key)
                        .and_then(|leaf| leaf.value())
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    item.push_str(&format!("[{}='{}']", key, value));
                }
                out.insert(item.clone(), None);
                let non_keys: Vec<ConfigNode> = element
                    .children()
                    .iter()
                    .filter(|c| !entry.is_key(&c.name))
                    .cloned()
                    .collect();
                flatten_children(&[entry], &non_keys, &item, out);
            }
        }
        NodeData::Leaf(value) => {
            out.insert(xpath.to_string(), Some(value.to_string()));
        }
        NodeData::LeafList(values) => {
            for value in values {
                out.insert(format!("{}[.='{}']", xpath, value), Some(value.to_string()));
            }
        }
    }
}

/// Children declared by any of `entries`. Names from a module other than
/// the first entry's are module-qualified.
fn flatten_children(
    entries: &[&SchemaEntry],
    children: &[ConfigNode],
    xpath: &str,
    out: &mut BTreeMap<String, Option<String>>,
) {
    let home = entries.first().map(|e| e.module.as_str());
    for child in children {
        match entries.iter().find_map(|e| e.find_child(&child.name)) {
            Some(child_entry) => {
                let child_xpath = if Some(child_entry.module.as_str()) == home {
                    format!("{}/{}", xpath, child.name)
                } else {
                    format!("{}/{}:{}", xpath, child_entry.module, child.name)
                };
                flatten_node(child_entry, child, &child_xpath, out)
            }
            None => tracing::warn!(xpath, name = %child.name, "no schema entry, not mirrored"),
        }
    }
}

/// Records every call; used by tests in this crate.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub calls: Vec<String>,
    pub fail_commit: bool,
}

#[cfg(test)]
impl Backend for RecordingBackend {
    fn lock(&mut self) -> Result<(), BackendError> {
        self.calls.push("lock".into());
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), BackendError> {
        self.calls.push("unlock".into());
        Ok(())
    }

    fn set(&mut self, xpath: &str, value: Option<&str>) -> Result<(), BackendError> {
        self.calls
            .push(format!("set {} {}", xpath, value.unwrap_or("")).trim_end().to_string());
        Ok(())
    }

    fn delete(&mut self, xpath: &str) -> Result<(), BackendError> {
        self.calls.push(format!("delete {}", xpath));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        self.calls.push("commit".into());
        if self.fail_commit {
            return Err(BackendError::Rejected {
                operation: "commit".into(),
                message: "validation failed".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    fn node(doc: serde_json::Value) -> ConfigNode {
        ConfigNode::from_json_with_schema(&fixtures::schema(), &doc).unwrap()
    }

    #[test]
    fn added_list_entry_and_leaf() {
        let schema = fixtures::schema();
        let before = node(json!({}));
        let after = node(json!({
            "isis": {"instance": [{"area-tag": "1", "vrf": "default", "description": "hello"}]}
        }));
        assert_eq!(
            leaf_edits(&schema, &before, &after),
            vec![
                Edit::Set {
                    xpath: "/frr-isisd:isis/instance[area-tag='1'][vrf='default']".into(),
                    value: None,
                },
                Edit::Set {
                    xpath: "/frr-isisd:isis/instance[area-tag='1'][vrf='default']/description"
                        .into(),
                    value: Some("hello".into()),
                },
            ]
        );
    }

    #[test]
    fn removed_entry_is_one_delete() {
        let schema = fixtures::schema();
        let before = node(json!({"users": {"user": [{"name": "hiroki", "age": 22}]}}));
        let after = node(json!({}));
        assert_eq!(
            leaf_edits(&schema, &before, &after),
            vec![Edit::Delete {
                xpath: "/main:users/user[name='hiroki']".into()
            }]
        );
    }

    #[test]
    fn unchanged_tree_has_no_edits() {
        let schema = fixtures::schema();
        let tree = node(json!({"users": {"user": [{"name": "hiroki", "age": 22}]}}));
        assert!(leaf_edits(&schema, &tree, &tree.deep_copy()).is_empty());
    }

    #[test]
    fn changed_leaf_is_a_set() {
        let schema = fixtures::schema();
        let before = node(json!({"users": {"user": [{"name": "hiroki", "age": 22}]}}));
        let after = node(json!({"users": {"user": [{"name": "hiroki", "age": 28}]}}));
        assert_eq!(
            leaf_edits(&schema, &before, &after),
            vec![Edit::Set {
                xpath: "/main:users/user[name='hiroki']/age".into(),
                value: Some("28".into()),
            }]
        );
    }

    #[test]
    fn augmenting_module_leaf_is_qualified() {
        let schema = fixtures::schema();
        let before = node(json!({}));
        let after = node(json!({"isis": {"debug": true}}));
        assert_eq!(
            leaf_edits(&schema, &before, &after),
            vec![Edit::Set {
                xpath: "/frr-isisd:isis/frr-isisd-ext:debug".into(),
                value: Some("true".into()),
            }]
        );
    }

    #[test]
    fn apply_unlocks_after_failed_commit() {
        let mut backend = RecordingBackend {
            fail_commit: true,
            ..Default::default()
        };
        let edits = vec![Edit::Delete {
            xpath: "/main:users".into(),
        }];
        assert!(backend.apply(&edits).is_err());
        assert_eq!(
            backend.calls,
            vec!["lock", "delete /main:users", "commit", "unlock"]
        );
    }
}
