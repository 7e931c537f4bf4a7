//! Schema-resolved paths into a configuration tree.

use std::fmt;

use vtyang_schema::{NodeKind, TypeDescriptor, ValidationError};

use crate::value::ConfigValue;

/// One resolved step of a [`Path`].
#[derive(Debug, Clone)]
pub struct PathSegment {
    pub module: String,
    pub name: String,
    pub kind: NodeKind,
    /// Key names of a list, in schema order.
    pub key_names: Vec<String>,
    /// Resolved key values in schema order. Shorter than `key_names` when
    /// the path stops at a partially keyed list.
    pub keys: Vec<(String, ConfigValue)>,
    /// Declared type of a leaf or leaf-list.
    pub value_type: Option<TypeDescriptor>,
    /// Member a union literal resolved to, once a value has been checked.
    pub resolved_member: Option<TypeDescriptor>,
}

impl PathSegment {
    pub fn new(module: &str, name: &str, kind: NodeKind) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            kind,
            key_names: Vec::new(),
            keys: Vec::new(),
            value_type: None,
            resolved_member: None,
        }
    }

    /// True when a list segment carries a value for every key.
    pub fn has_all_keys(&self) -> bool {
        self.kind != NodeKind::List || self.keys.len() == self.key_names.len()
    }

    /// Union members this segment may resolve to, in declaration order.
    pub fn union_members(&self) -> Vec<&TypeDescriptor> {
        self.value_type
            .as_ref()
            .map(|ty| ty.flattened_union())
            .unwrap_or_default()
    }

    /// Convert a literal for this leaf, honouring a pre-resolved union member.
    pub fn parse_value(&self, literal: &str) -> Result<ConfigValue, ValidationError> {
        let Some(declared) = &self.value_type else {
            return Ok(ConfigValue::String(literal.to_string()));
        };
        match &self.resolved_member {
            Some(member) => ConfigValue::parse_resolved(declared, member, literal),
            None => ConfigValue::parse(declared, literal),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}", self.name)?;
        } else {
            write!(f, "{}:{}", self.module, self.name)?;
        }
        for (name, value) in &self.keys {
            write!(f, "[{}='{}']", name, value)?;
        }
        Ok(())
    }
}

/// An ordered list of resolved segments. Built per command, never stored.
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Check if this path is empty (the root).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut PathSegment> {
        self.segments.last_mut()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Path of the first `len` segments.
    pub fn prefix(&self, len: usize) -> Path {
        Path {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Path without its last segment.
    pub fn parent(&self) -> Path {
        self.prefix(self.len().saturating_sub(1))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl std::ops::Index<usize> for Path {
    type Output = PathSegment;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}
