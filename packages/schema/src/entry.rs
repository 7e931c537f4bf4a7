//! Schema entries: the compiled node graph of a YANG module.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TypeDescriptor;

/// Kind of an addressable data node.
///
/// Choice, case and rpc entries never appear in a data tree, so they have no
/// `NodeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Container => "container",
            NodeKind::List => "list",
            NodeKind::Leaf => "leaf",
            NodeKind::LeafList => "leaf-list",
        };
        f.write_str(name)
    }
}

/// One compiled schema node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// `false` marks operational state (YANG `config false`).
    #[serde(default = "default_config")]
    pub config: bool,
    #[serde(flatten)]
    pub node: EntryNode,
}

fn default_config() -> bool {
    true
}

/// Per-kind payload of a [`SchemaEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EntryNode {
    Container {
        #[serde(default)]
        children: Vec<SchemaEntry>,
    },
    List {
        keys: Vec<String>,
        #[serde(default)]
        children: Vec<SchemaEntry>,
    },
    Leaf {
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
    LeafList {
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
    Choice {
        #[serde(default)]
        cases: Vec<SchemaCase>,
    },
    Rpc {
        #[serde(default)]
        input: Vec<SchemaEntry>,
        #[serde(default)]
        output: Vec<SchemaEntry>,
    },
}

/// A case of a choice. Its children belong to the enclosing data node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCase {
    pub name: String,
    #[serde(default)]
    pub children: Vec<SchemaEntry>,
}

impl SchemaEntry {
    pub fn container(name: &str, children: Vec<SchemaEntry>) -> Self {
        Self::with_node(name, EntryNode::Container { children })
    }

    pub fn list(name: &str, keys: &[&str], children: Vec<SchemaEntry>) -> Self {
        let keys = keys.iter().map(|k| k.to_string()).collect();
        Self::with_node(name, EntryNode::List { keys, children })
    }

    pub fn leaf(name: &str, ty: TypeDescriptor) -> Self {
        Self::with_node(name, EntryNode::Leaf { ty })
    }

    pub fn leaf_list(name: &str, ty: TypeDescriptor) -> Self {
        Self::with_node(name, EntryNode::LeafList { ty })
    }

    pub fn choice(name: &str, cases: Vec<SchemaCase>) -> Self {
        Self::with_node(name, EntryNode::Choice { cases })
    }

    pub fn rpc(name: &str, input: Vec<SchemaEntry>, output: Vec<SchemaEntry>) -> Self {
        Self::with_node(name, EntryNode::Rpc { input, output })
    }

    fn with_node(name: &str, node: EntryNode) -> Self {
        Self {
            name: name.to_string(),
            module: String::new(),
            description: String::new(),
            config: true,
            node,
        }
    }

    /// Mark this entry as operational state.
    pub fn read_only(mut self) -> Self {
        self.config = false;
        self
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn node_kind(&self) -> Option<NodeKind> {
        match self.node {
            EntryNode::Container { .. } => Some(NodeKind::Container),
            EntryNode::List { .. } => Some(NodeKind::List),
            EntryNode::Leaf { .. } => Some(NodeKind::Leaf),
            EntryNode::LeafList { .. } => Some(NodeKind::LeafList),
            EntryNode::Choice { .. } | EntryNode::Rpc { .. } => None,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.node, EntryNode::Choice { .. })
    }

    pub fn is_rpc(&self) -> bool {
        matches!(self.node, EntryNode::Rpc { .. })
    }

    pub fn is_read_only(&self) -> bool {
        !self.config
    }

    /// Ordered key names; empty for anything but a list.
    pub fn keys(&self) -> &[String] {
        match &self.node {
            EntryNode::List { keys, .. } => keys,
            _ => &[],
        }
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.keys().iter().any(|k| k == name)
    }

    /// Declared type of a leaf or leaf-list.
    pub fn ty(&self) -> Option<&TypeDescriptor> {
        match &self.node {
            EntryNode::Leaf { ty } | EntryNode::LeafList { ty } => Some(ty),
            _ => None,
        }
    }

    /// Direct children as declared, with choices left in place.
    ///
    /// For an rpc these are the input parameters.
    pub fn children(&self) -> &[SchemaEntry] {
        match &self.node {
            EntryNode::Container { children } | EntryNode::List { children, .. } => children,
            EntryNode::Rpc { input, .. } => input,
            _ => &[],
        }
    }

    /// Children as seen by a data tree: every choice is replaced by the
    /// children of its cases, recursively.
    pub fn addressable_children(&self) -> AddressableChildren<'_> {
        AddressableChildren::new(self.children())
    }

    /// Look up an addressable child by name.
    pub fn find_child(&self, name: &str) -> Option<&SchemaEntry> {
        self.addressable_children().find(|child| child.name == name)
    }
}

impl SchemaCase {
    pub fn new(name: &str, children: Vec<SchemaEntry>) -> Self {
        Self {
            name: name.to_string(),
            children,
        }
    }
}

/// Depth-first iterator that flattens choice/case nodes.
///
/// Used by every consumer that needs a node's data children so that choice
/// transparency is implemented once.
pub struct AddressableChildren<'a> {
    stack: Vec<std::slice::Iter<'a, SchemaEntry>>,
}

impl<'a> AddressableChildren<'a> {
    pub fn new(entries: &'a [SchemaEntry]) -> Self {
        Self {
            stack: vec![entries.iter()],
        }
    }
}

impl<'a> Iterator for AddressableChildren<'a> {
    type Item = &'a SchemaEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(iter) = self.stack.last_mut() {
            let Some(entry) = iter.next() else {
                self.stack.pop();
                continue;
            };
            match &entry.node {
                EntryNode::Choice { cases } => {
                    // Cases are pushed in reverse so the first case is drained first.
                    for case in cases.iter().rev() {
                        self.stack.push(case.children.iter());
                    }
                }
                _ => return Some(entry),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    fn string() -> TypeDescriptor {
        TypeDescriptor::new(TypeKind::String)
    }

    fn transport() -> SchemaEntry {
        SchemaEntry::container(
            "transport",
            vec![
                SchemaEntry::leaf("description", string()),
                SchemaEntry::choice(
                    "proto",
                    vec![
                        SchemaCase::new("tcp", vec![SchemaEntry::leaf("tcp-port", string())]),
                        SchemaCase::new(
                            "udp",
                            vec![
                                SchemaEntry::leaf("udp-port", string()),
                                SchemaEntry::choice(
                                    "mode",
                                    vec![SchemaCase::new(
                                        "fast",
                                        vec![SchemaEntry::leaf("burst", string())],
                                    )],
                                ),
                            ],
                        ),
                    ],
                ),
                SchemaEntry::leaf("mtu", TypeDescriptor::new(TypeKind::Uint16)),
            ],
        )
    }

    #[test]
    fn addressable_children_flattens_choices_in_order() {
        let entry = transport();
        let names: Vec<&str> = entry
            .addressable_children()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["description", "tcp-port", "udp-port", "burst", "mtu"]
        );
    }

    #[test]
    fn find_child_sees_through_cases() {
        let entry = transport();
        assert!(entry.find_child("burst").is_some());
        assert!(entry.find_child("proto").is_none());
        assert!(entry.find_child("missing").is_none());
    }

    #[test]
    fn list_keys_and_kinds() {
        let list = SchemaEntry::list(
            "instance",
            &["area-tag", "vrf"],
            vec![
                SchemaEntry::leaf("area-tag", string()),
                SchemaEntry::leaf("vrf", string()),
            ],
        );
        assert_eq!(list.keys(), &["area-tag".to_string(), "vrf".to_string()]);
        assert!(list.is_key("vrf"));
        assert_eq!(list.node_kind(), Some(NodeKind::List));
        assert!(SchemaEntry::choice("c", vec![]).node_kind().is_none());
    }

    #[test]
    fn deserializes_compiled_form() {
        let json = r#"{
            "name": "user",
            "kind": "list",
            "keys": ["name"],
            "children": [
                {"name": "name", "kind": "leaf", "type": {"base": "string"}},
                {"name": "age", "kind": "leaf", "type": {"base": "uint8"}},
                {"name": "uptime", "kind": "leaf", "config": false,
                 "type": {"base": "uint32"}}
            ]
        }"#;
        let entry: SchemaEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.keys(), &["name".to_string()]);
        let age = entry.find_child("age").unwrap();
        assert_eq!(age.ty().unwrap().base, TypeKind::Uint8);
        assert!(entry.find_child("uptime").unwrap().is_read_only());
        assert!(!age.is_read_only());
    }

    #[test]
    fn node_kind_display() {
        assert_eq!(NodeKind::LeafList.to_string(), "leaf-list");
        assert_eq!(NodeKind::Container.to_string(), "container");
    }
}
