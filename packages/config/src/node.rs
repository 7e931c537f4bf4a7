//! The configuration tree and its path-addressed operations.

use vtyang_schema::NodeKind;

use crate::error::ConfigError;
use crate::path::{Path, PathSegment};
use crate::value::ConfigValue;

/// One node of a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    pub name: String,
    pub data: NodeData,
}

/// Payload of a [`ConfigNode`].
///
/// Container children have distinct names and are kept sorted by name.
/// List elements are anonymous containers holding their key leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Container(Vec<ConfigNode>),
    List(Vec<ConfigNode>),
    Leaf(ConfigValue),
    LeafList(Vec<ConfigValue>),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Container(_) => NodeKind::Container,
            NodeData::List(_) => NodeKind::List,
            NodeData::Leaf(_) => NodeKind::Leaf,
            NodeData::LeafList(_) => NodeKind::LeafList,
        }
    }
}

impl Default for ConfigNode {
    fn default() -> Self {
        Self::root()
    }
}

impl ConfigNode {
    /// An empty document.
    pub fn root() -> Self {
        Self::container("", Vec::new())
    }

    pub fn container(name: &str, mut children: Vec<ConfigNode>) -> Self {
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            name: name.to_string(),
            data: NodeData::Container(children),
        }
    }

    pub fn list(name: &str, elements: Vec<ConfigNode>) -> Self {
        Self {
            name: name.to_string(),
            data: NodeData::List(elements),
        }
    }

    /// An anonymous list element.
    pub fn element(children: Vec<ConfigNode>) -> Self {
        Self::container("", children)
    }

    pub fn leaf(name: &str, value: ConfigValue) -> Self {
        Self {
            name: name.to_string(),
            data: NodeData::Leaf(value),
        }
    }

    pub fn leaf_list(name: &str, values: Vec<ConfigValue>) -> Self {
        Self {
            name: name.to_string(),
            data: NodeData::LeafList(values),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Container children or list elements.
    pub fn children(&self) -> &[ConfigNode] {
        match &self.data {
            NodeData::Container(children) | NodeData::List(children) => children,
            NodeData::Leaf(_) | NodeData::LeafList(_) => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        match &self.data {
            NodeData::Container(children) => children.iter().find(|c| c.name == name),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&ConfigValue> {
        match &self.data {
            NodeData::Leaf(value) => Some(value),
            _ => None,
        }
    }

    pub fn values(&self) -> &[ConfigValue] {
        match &self.data {
            NodeData::LeafList(values) => values,
            _ => &[],
        }
    }

    /// True for a container without children.
    pub fn is_empty(&self) -> bool {
        matches!(&self.data, NodeData::Container(children) if children.is_empty())
    }

    /// Key values are compared in rendered form so that a value decoded
    /// without a schema still matches its typed counterpart.
    fn matches_keys(&self, keys: &[(String, ConfigValue)]) -> bool {
        keys.iter().all(|(name, expected)| {
            self.child(name)
                .and_then(ConfigNode::value)
                .is_some_and(|actual| actual.to_string() == expected.to_string())
        })
    }

    fn find_element(&self, keys: &[(String, ConfigValue)]) -> Option<&ConfigNode> {
        match &self.data {
            NodeData::List(elements) => elements.iter().find(|e| e.matches_keys(keys)),
            _ => None,
        }
    }

    /// Look up the node at `path`.
    ///
    /// A missing node is `Ok(None)`. A list segment without keys at the end
    /// of the path yields the list itself.
    pub fn get(&self, path: &Path) -> Result<Option<&ConfigNode>, ConfigError> {
        let mut current = self;
        for (depth, segment) in path.iter().enumerate() {
            let terminal = depth + 1 == path.len();
            let children = current.container_children(path, depth)?;
            let Some(child) = children.iter().find(|c| c.name == segment.name) else {
                return Ok(None);
            };
            expect_kind(child, segment, path, depth)?;
            current = match segment.kind {
                NodeKind::List if segment.has_all_keys() => {
                    match child.find_element(&segment.keys) {
                        Some(element) => element,
                        None => return Ok(None),
                    }
                }
                NodeKind::List if terminal => child,
                NodeKind::List => return Err(incomplete_keys(path, depth)),
                _ => child,
            };
        }
        Ok(Some(current))
    }

    /// Create or overwrite the node at `path`.
    ///
    /// Intermediate containers and list elements are created as needed;
    /// a list element is found by its full key tuple before a new one is
    /// made. Leaf-lists are replaced by the whitespace-separated values of
    /// `raw`. The value is converted before anything is touched, so a
    /// failed set leaves the tree unchanged.
    pub fn set(&mut self, path: &Path, raw: Option<&str>) -> Result<(), ConfigError> {
        let Some(terminal) = path.last() else {
            return Err(ConfigError::MissingValue {
                path: path.to_string(),
            });
        };
        for (depth, segment) in path.iter().enumerate() {
            if !segment.has_all_keys() {
                return Err(incomplete_keys(path, depth));
            }
        }
        reject_key_leaf(path)?;

        let missing_value = || ConfigError::MissingValue {
            path: path.to_string(),
        };
        let data = match terminal.kind {
            NodeKind::Leaf => {
                let raw = raw.ok_or_else(missing_value)?;
                Some(NodeData::Leaf(terminal.parse_value(raw)?))
            }
            NodeKind::LeafList => {
                let values = raw
                    .ok_or_else(missing_value)?
                    .split_whitespace()
                    .map(|v| terminal.parse_value(v))
                    .collect::<Result<Vec<_>, _>>()?;
                if values.is_empty() {
                    return Err(missing_value());
                }
                Some(NodeData::LeafList(values))
            }
            NodeKind::Container | NodeKind::List => None,
        };

        let last = path.len() - 1;
        let mut current = self;
        for depth in 0..last {
            current = current.descend_or_create(path, depth)?;
        }
        match data {
            Some(data) => current.upsert_child(path, last, data),
            None => current.descend_or_create(path, last).map(|_| ()),
        }
    }

    /// Remove the node at `path`. An empty path clears the whole document.
    pub fn delete(&mut self, path: &Path) -> Result<(), ConfigError> {
        let Some(terminal) = path.last() else {
            let children = self.container_children_mut(path, 0)?;
            children.clear();
            return Ok(());
        };
        let not_found = || ConfigError::NotFound {
            path: path.to_string(),
        };
        reject_key_leaf(path)?;

        let depth = path.len() - 1;
        let parent = self.lookup_mut(path, depth)?.ok_or_else(not_found)?;
        let children = parent.container_children_mut(path, depth)?;
        let index = children
            .iter()
            .position(|c| c.name == terminal.name)
            .ok_or_else(not_found)?;
        expect_kind(&children[index], terminal, path, depth)?;

        if terminal.kind == NodeKind::List && !terminal.keys.is_empty() {
            if !terminal.has_all_keys() {
                return Err(incomplete_keys(path, depth));
            }
            let found = children[index].kind();
            let NodeData::List(elements) = &mut children[index].data else {
                return Err(structural(path, depth + 1, "list", found));
            };
            let position = elements
                .iter()
                .position(|e| e.matches_keys(&terminal.keys))
                .ok_or_else(not_found)?;
            elements.remove(position);
            if elements.is_empty() {
                children.remove(index);
            }
        } else {
            children.remove(index);
        }
        tracing::debug!(%path, "deleted node");
        Ok(())
    }

    /// Equality that ignores container child order but keeps list order.
    pub fn structurally_eq(&self, other: &ConfigNode) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.data, &other.data) {
            (NodeData::Container(a), NodeData::Container(b)) => {
                a.len() == b.len()
                    && a.iter().all(|x| {
                        b.iter()
                            .find(|y| y.name == x.name)
                            .is_some_and(|y| x.structurally_eq(y))
                    })
            }
            (NodeData::List(a), NodeData::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
            }
            (NodeData::Leaf(a), NodeData::Leaf(b)) => a == b,
            (NodeData::LeafList(a), NodeData::LeafList(b)) => a == b,
            _ => false,
        }
    }

    /// Independent copy of the whole subtree.
    pub fn deep_copy(&self) -> ConfigNode {
        self.clone()
    }

    fn container_children(
        &self,
        path: &Path,
        depth: usize,
    ) -> Result<&Vec<ConfigNode>, ConfigError> {
        match &self.data {
            NodeData::Container(children) => Ok(children),
            other => Err(structural(path, depth, "container", other.kind())),
        }
    }

    fn container_children_mut(
        &mut self,
        path: &Path,
        depth: usize,
    ) -> Result<&mut Vec<ConfigNode>, ConfigError> {
        match &mut self.data {
            NodeData::Container(children) => Ok(children),
            other => Err(structural(path, depth, "container", other.kind())),
        }
    }

    fn lookup_mut(
        &mut self,
        path: &Path,
        len: usize,
    ) -> Result<Option<&mut ConfigNode>, ConfigError> {
        let mut current = self;
        for depth in 0..len {
            let segment = &path[depth];
            let node = current;
            let children = node.container_children_mut(path, depth)?;
            let Some(child) = children.iter_mut().find(|c| c.name == segment.name) else {
                return Ok(None);
            };
            expect_kind(child, segment, path, depth)?;
            current = match segment.kind {
                NodeKind::List => {
                    if !segment.has_all_keys() {
                        return Err(incomplete_keys(path, depth));
                    }
                    let found = child.kind();
                    let NodeData::List(elements) = &mut child.data else {
                        return Err(structural(path, depth + 1, "list", found));
                    };
                    match elements.iter_mut().find(|e| e.matches_keys(&segment.keys)) {
                        Some(element) => element,
                        None => return Ok(None),
                    }
                }
                _ => child,
            };
        }
        Ok(Some(current))
    }

    fn descend_or_create(
        &mut self,
        path: &Path,
        depth: usize,
    ) -> Result<&mut ConfigNode, ConfigError> {
        let segment = &path[depth];
        if matches!(segment.kind, NodeKind::Leaf | NodeKind::LeafList) {
            return Err(ConfigError::Structural {
                path: path.prefix(depth + 1).to_string(),
                expected: "container or list".to_string(),
                found: segment.kind.to_string(),
            });
        }

        let children = self.container_children_mut(path, depth)?;
        let index = match children.iter().position(|c| c.name == segment.name) {
            Some(index) => index,
            None => {
                let empty = match segment.kind {
                    NodeKind::List => ConfigNode::list(&segment.name, Vec::new()),
                    _ => ConfigNode::container(&segment.name, Vec::new()),
                };
                insert_sorted(children, empty)
            }
        };
        let child = &mut children[index];
        expect_kind(child, segment, path, depth)?;
        if segment.kind != NodeKind::List {
            return Ok(child);
        }

        let found = child.kind();
        let NodeData::List(elements) = &mut child.data else {
            return Err(structural(path, depth + 1, "list", found));
        };
        let index = match elements.iter().position(|e| e.matches_keys(&segment.keys)) {
            Some(index) => index,
            None => {
                tracing::debug!(list = %segment, "creating list element");
                elements.push(element_with_keys(segment));
                elements.len() - 1
            }
        };
        Ok(&mut elements[index])
    }

    fn upsert_child(
        &mut self,
        path: &Path,
        depth: usize,
        data: NodeData,
    ) -> Result<(), ConfigError> {
        let segment = &path[depth];
        let children = self.container_children_mut(path, depth)?;
        match children.iter_mut().find(|c| c.name == segment.name) {
            Some(existing) => {
                expect_kind(existing, segment, path, depth)?;
                existing.data = data;
            }
            None => {
                insert_sorted(
                    children,
                    ConfigNode {
                        name: segment.name.clone(),
                        data,
                    },
                );
            }
        }
        Ok(())
    }
}

/// A leaf directly under a list element that is one of the list's keys.
fn reject_key_leaf(path: &Path) -> Result<(), ConfigError> {
    let len = path.len();
    if len < 2 {
        return Ok(());
    }
    let (list, leaf) = (&path[len - 2], &path[len - 1]);
    if list.kind == NodeKind::List
        && matches!(leaf.kind, NodeKind::Leaf | NodeKind::LeafList)
        && list.key_names.contains(&leaf.name)
    {
        return Err(ConfigError::KeyLeaf {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn element_with_keys(segment: &PathSegment) -> ConfigNode {
    let keys = segment
        .keys
        .iter()
        .map(|(name, value)| ConfigNode::leaf(name, value.clone()))
        .collect();
    ConfigNode::element(keys)
}

fn insert_sorted(children: &mut Vec<ConfigNode>, node: ConfigNode) -> usize {
    let index = children.partition_point(|c| c.name < node.name);
    children.insert(index, node);
    index
}

fn expect_kind(
    node: &ConfigNode,
    segment: &PathSegment,
    path: &Path,
    depth: usize,
) -> Result<(), ConfigError> {
    if node.kind() == segment.kind {
        Ok(())
    } else {
        Err(structural(
            path,
            depth + 1,
            &segment.kind.to_string(),
            node.kind(),
        ))
    }
}

fn structural(path: &Path, depth: usize, expected: &str, found: NodeKind) -> ConfigError {
    let err = ConfigError::Structural {
        path: path.prefix(depth).to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    };
    tracing::error!(%err, "tree and schema disagree");
    err
}

fn incomplete_keys(path: &Path, depth: usize) -> ConfigError {
    ConfigError::IncompleteKeys {
        path: path.prefix(depth + 1).to_string(),
        keys: path[depth].key_names.clone(),
    }
}
