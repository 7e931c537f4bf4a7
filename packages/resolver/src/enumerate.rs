//! Legal literal sets for the position after a partially typed command.

use vtyang_schema::{NodeKind, TypeDescriptor, TypeKind};

use crate::resolver::{Backtracked, Resolver};

/// Every literal `ty` accepts when that set is finite.
///
/// Enum names, identities as `module:name`, and `true`/`false` for booleans.
/// Union members contribute their sets in declaration order, deduplicated.
/// Open-ended kinds contribute nothing.
pub fn enumerate_values(ty: &TypeDescriptor) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for member in ty.flattened_union() {
        let values: Vec<String> = match member.base {
            TypeKind::Enumeration => member.enums.clone(),
            TypeKind::Identityref => member.identities.iter().map(|i| i.to_string()).collect(),
            TypeKind::Boolean => vec!["true".to_string(), "false".to_string()],
            _ => Vec::new(),
        };
        for value in values {
            if !out.contains(&value) {
                out.push(value);
            }
        }
    }
    out
}

impl<'a> Resolver<'a> {
    /// Type of the value expected right after the resolved tokens.
    ///
    /// That is the leaf's type when nothing trails it, the leaf-list's type
    /// regardless of earlier values, and the next key's type for a partially
    /// keyed list.
    pub fn pending_type(&self, bt: &Backtracked) -> Option<&'a TypeDescriptor> {
        let last = bt.resolved.path.last()?;
        let entry = self.entry_for(&bt.resolved.path)?;
        match last.kind {
            NodeKind::Leaf if bt.tail.is_empty() => entry.ty(),
            NodeKind::LeafList => entry.ty(),
            NodeKind::List if bt.tail.is_empty() && !last.has_all_keys() => {
                let key = last.key_names.get(last.keys.len())?;
                entry.find_child(key)?.ty()
            }
            _ => None,
        }
    }

    /// Enumerable values for the pending position, filtered by `prefix`.
    pub fn enumerate_values(&self, bt: &Backtracked, prefix: &str) -> Vec<String> {
        self.pending_type(bt)
            .map(enumerate_values)
            .unwrap_or_default()
            .into_iter()
            .filter(|v| v.starts_with(prefix))
            .collect()
    }
}
