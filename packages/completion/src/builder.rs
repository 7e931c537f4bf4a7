//! Schema-derived completion subtrees, one per command family.

use vtyang_schema::{EntryNode, NodeKind, SchemaEntry, SchemaIndex, TypeDescriptor};

use crate::node::CompletionNode;

/// Which schema nodes a family admits and how their positions end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Writable entries; leaves take a value (`set`).
    Config,
    /// Config entries addressed by path only (`delete`, `show running-config`).
    View,
    /// State leaves and the list keys leading to them (`show` in view mode).
    Operational,
    /// Rpc names and their input leaves (`rpc`).
    Rpc,
}

/// Completion roots for every top-level entry of `schema` in `family`,
/// merged by name across modules.
pub fn build(schema: &SchemaIndex, family: Family) -> Vec<CompletionNode> {
    let mut root = CompletionNode::root();
    match family {
        Family::Rpc => {
            for rpc in schema.rpcs() {
                root.add_child(rpc_node(rpc));
            }
        }
        _ => {
            for entry in schema.top_entries() {
                if let Some(node) = entry_node(entry, family, false) {
                    root.add_child(node);
                }
            }
        }
    }
    root.children
}

fn entry_node(entry: &SchemaEntry, family: Family, in_state: bool) -> Option<CompletionNode> {
    let kind = entry.node_kind()?;
    let state = in_state || entry.is_read_only();
    if state && family != Family::Operational {
        return None;
    }

    let literal = CompletionNode::literal(&entry.name, &entry.description).with_module(&entry.module);
    let node = match kind {
        NodeKind::Leaf => {
            if family == Family::Operational && !state {
                return None;
            }
            literal.with_children(leaf_tail(entry, family, false))
        }
        NodeKind::LeafList => {
            if family == Family::Operational && !state {
                return None;
            }
            literal.with_children(leaf_tail(entry, family, true))
        }
        NodeKind::Container => {
            let children = child_nodes(entry, family, state, &[]);
            if family == Family::Operational && children.is_empty() {
                return None;
            }
            literal.with_children(path_end(family)).with_children(children)
        }
        NodeKind::List => {
            let keys = entry.keys();
            let children = child_nodes(entry, family, state, keys);
            if family == Family::Operational && children.is_empty() {
                return None;
            }
            literal
                .with_children(path_end(family))
                .with_children(vec![key_chain(entry, keys, family, children)])
        }
    };
    Some(node)
}

/// Addressable children of `entry` other than its keys.
fn child_nodes(
    entry: &SchemaEntry,
    family: Family,
    in_state: bool,
    keys: &[String],
) -> Vec<CompletionNode> {
    entry
        .addressable_children()
        .filter(|child| !keys.contains(&child.name))
        .filter_map(|child| entry_node(child, family, in_state))
        .collect()
}

/// One NAME level per key; each level may end the path, the last one also
/// carries the non-key children.
fn key_chain(
    list: &SchemaEntry,
    keys: &[String],
    family: Family,
    children: Vec<CompletionNode>,
) -> CompletionNode {
    let Some((key, rest)) = keys.split_first() else {
        return CompletionNode::name_wildcard("").with_children(children);
    };
    let help = list
        .find_child(key)
        .map(|k| key_help(key, k.ty()))
        .unwrap_or_else(|| key.clone());
    let mut level = CompletionNode::name_wildcard(&help).with_module(&list.module);
    if rest.is_empty() {
        level = level
            .with_children(vec![CompletionNode::cr()])
            .with_children(children);
    } else {
        if family != Family::Config {
            level = level.with_children(vec![CompletionNode::cr()]);
        }
        level = level.with_children(vec![key_chain(list, rest, family, children)]);
    }
    level
}

fn key_help(key: &str, ty: Option<&TypeDescriptor>) -> String {
    match ty {
        Some(ty) => format!("{key} ({})", type_help(ty)),
        None => key.to_string(),
    }
}

fn type_help(ty: &TypeDescriptor) -> String {
    ty.typedef.clone().unwrap_or_else(|| ty.base.name().to_string())
}

/// Containers and lists end a path everywhere except under `set`.
fn path_end(family: Family) -> Vec<CompletionNode> {
    match family {
        Family::Config => Vec::new(),
        _ => vec![CompletionNode::cr()],
    }
}

fn leaf_tail(entry: &SchemaEntry, family: Family, repeat: bool) -> Vec<CompletionNode> {
    if family != Family::Config {
        return vec![CompletionNode::cr()];
    }
    let help = entry.ty().map(type_help).unwrap_or_default();
    let mut value = CompletionNode::value(&help)
        .with_module(&entry.module)
        .with_children(vec![CompletionNode::cr()]);
    if repeat {
        value = value.repeating();
    }
    vec![value]
}

fn rpc_node(rpc: &SchemaEntry) -> CompletionNode {
    let inputs = rpc
        .addressable_children()
        .filter(|input| matches!(input.node, EntryNode::Leaf { .. } | EntryNode::LeafList { .. }))
        .map(|input| {
            CompletionNode::literal(&input.name, &input.description)
                .with_module(&rpc.module)
                .with_children(leaf_tail(input, Family::Config, input.node_kind() == Some(NodeKind::LeafList)))
        })
        .collect();
    CompletionNode::literal(&rpc.name, &rpc.description)
        .with_module(&rpc.module)
        .with_children(vec![CompletionNode::cr()])
        .with_children(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::node::CompletionKind;

    fn find<'a>(nodes: &'a [CompletionNode], words: &[&str]) -> &'a CompletionNode {
        let (first, rest) = words.split_first().unwrap();
        let top = nodes.iter().find(|n| n.name == *first).unwrap();
        top.find(rest).unwrap()
    }

    fn names(node: &CompletionNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn config_family_skips_state() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Config);
        let tops: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(tops, vec!["isis", "users", "values"]);
    }

    #[test]
    fn config_leaf_takes_a_value() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Config);
        let crypto = find(&nodes, &["values", "crypto"]);
        assert_eq!(names(crypto), vec!["VALUE"]);
        assert_eq!(crypto.children[0].description, "enumeration");
        assert_eq!(names(&crypto.children[0]), vec!["<cr>"]);
    }

    #[test]
    fn choice_members_are_inlined() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Config);
        let values = find(&nodes, &["values"]);
        assert!(values.child("alpha").is_some());
        assert!(values.child("beta").is_some());
        assert!(values.child("mode").is_none());
    }

    #[test]
    fn leaf_list_value_repeats() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Config);
        let value = &find(&nodes, &["values", "tags"]).children[0];
        assert_eq!(value.kind, CompletionKind::Value);
        assert!(value.repeat);
    }

    #[test]
    fn list_nests_one_name_per_key() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Config);
        let instance = find(&nodes, &["isis", "instance"]);
        assert_eq!(names(instance), vec!["NAME"]);
        let first = &instance.children[0];
        assert_eq!(first.description, "area-tag (string)");
        assert_eq!(names(first), vec!["NAME"]);
        let second = &first.children[0];
        assert_eq!(second.description, "vrf (enumeration)");
        assert_eq!(names(second), vec!["<cr>", "area-address", "description"]);
    }

    #[test]
    fn view_family_ends_paths_everywhere() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::View);
        assert_eq!(names(find(&nodes, &["users"])), vec!["<cr>", "user"]);
        assert_eq!(names(find(&nodes, &["users", "user"])), vec!["<cr>", "NAME"]);
        assert_eq!(names(find(&nodes, &["values", "crypto"])), vec!["<cr>"]);
        assert!(nodes.iter().all(|n| n.name != "state"));
    }

    #[test]
    fn operational_family_keeps_state_and_keys() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Operational);
        let tops: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(tops, vec!["isis", "state"]);
        assert_eq!(names(find(&nodes, &["state"])), vec!["<cr>", "uptime"]);

        let instance = find(&nodes, &["isis", "instance"]);
        let last = instance.child("NAME").unwrap().child("NAME").unwrap();
        assert_eq!(last.kind, CompletionKind::Name);
        assert_eq!(names(last), vec!["<cr>", "adjacency-count"]);
    }

    #[test]
    fn rpc_family_lists_inputs() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Rpc);
        let rpc = find(&nodes, &["clear-counters"]);
        assert_eq!(names(rpc), vec!["<cr>", "interface"]);
        assert_eq!(names(find(&nodes, &["clear-counters", "interface"])), vec!["VALUE"]);
    }

    #[test]
    fn merges_same_top_level_name_across_modules() {
        let schema = fixtures::schema();
        let nodes = build(&schema, Family::Config);
        let isis = find(&nodes, &["isis"]);
        assert_eq!(isis.modules, vec!["frr-isisd", "frr-isisd-ext"]);
        assert!(isis.child("instance").is_some());
        assert!(isis.child("debug").is_some());
    }
}
