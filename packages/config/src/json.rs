//! JSON import and export of configuration trees.

use serde_json::{Map, Value as Json};
use vtyang_schema::{EntryNode, NodeKind, SchemaEntry, SchemaIndex};

use crate::error::ConfigError;
use crate::node::{ConfigNode, NodeData};
use crate::value::ConfigValue;

impl ConfigNode {
    /// Encode as JSON. Object keys come out sorted.
    pub fn to_json(&self) -> Json {
        match &self.data {
            NodeData::Container(children) => {
                let map: Map<String, Json> = children
                    .iter()
                    .map(|child| (child.name.clone(), child.to_json()))
                    .collect();
                Json::Object(map)
            }
            NodeData::List(elements) => {
                Json::Array(elements.iter().map(ConfigNode::to_json).collect())
            }
            NodeData::Leaf(value) => value.to_json(),
            NodeData::LeafList(values) => {
                Json::Array(values.iter().map(ConfigValue::to_json).collect())
            }
        }
    }

    /// Pretty-printed JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode a document without a schema, inferring node kinds and value
    /// widths from the JSON shape.
    ///
    /// Objects become containers, arrays of objects become lists, arrays of
    /// scalars become leaf-lists and `null` becomes an empty container.
    pub fn from_json(json: &Json) -> Result<ConfigNode, ConfigError> {
        infer_node("", json, "")
    }

    /// Decode a document against the schema: every name must exist and every
    /// leaf literal is converted to its declared type.
    pub fn from_json_with_schema(
        schema: &SchemaIndex,
        json: &Json,
    ) -> Result<ConfigNode, ConfigError> {
        let map = match json {
            Json::Null => return Ok(ConfigNode::root()),
            Json::Object(map) => map,
            other => return Err(json_error("/", format!("expected object, got {}", other))),
        };
        let mut children = Vec::with_capacity(map.len());
        for (key, value) in map {
            let tops = schema.find_tops(unqualified(key));
            let Some(first) = tops.first() else {
                return Err(ConfigError::UnknownNode {
                    path: "/".to_string(),
                    name: key.clone(),
                });
            };
            // Containers declared by several modules share one node.
            let node = if tops.len() > 1 && first.node_kind() == Some(NodeKind::Container) {
                let path = format!("/{}", first.name);
                ConfigNode::container(&first.name, decode_children(&tops, value, &path)?)
            } else {
                decode_entry(first, value, "")?
            };
            children.push(node);
        }
        Ok(ConfigNode::container("", children))
    }

    /// Copy of the document with each top-level name qualified by its
    /// owning module, as in `module:name`.
    pub fn qualify_top_level(&self, schema: &SchemaIndex) -> ConfigNode {
        let children = self
            .children()
            .iter()
            .map(|child| {
                let mut child = child.clone();
                if let Some(entry) = schema.find_top(&child.name) {
                    child.name = format!("{}:{}", entry.module, child.name);
                }
                child
            })
            .collect();
        ConfigNode::container(&self.name, children)
    }
}

fn unqualified(name: &str) -> &str {
    name.split_once(':').map(|(_, n)| n).unwrap_or(name)
}

fn json_error(path: &str, message: String) -> ConfigError {
    ConfigError::Json {
        path: path.to_string(),
        message,
    }
}

fn infer_node(name: &str, json: &Json, parent: &str) -> Result<ConfigNode, ConfigError> {
    let path = if name.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, name)
    };
    match json {
        Json::Null => Ok(ConfigNode::container(name, Vec::new())),
        Json::Object(map) => {
            let children = map
                .iter()
                .map(|(key, value)| infer_node(key, value, &path))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConfigNode::container(name, children))
        }
        Json::Array(items) if items.iter().all(Json::is_object) => {
            let elements = items
                .iter()
                .map(|item| infer_node("", item, &path))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConfigNode::list(name, elements))
        }
        Json::Array(items) => {
            let values = items
                .iter()
                .map(|item| {
                    ConfigValue::infer(item)
                        .ok_or_else(|| json_error(&path, format!("mixed array member {}", item)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConfigNode::leaf_list(name, values))
        }
        scalar => ConfigValue::infer(scalar)
            .map(|value| ConfigNode::leaf(name, value))
            .ok_or_else(|| json_error(&path, format!("unsupported value {}", scalar))),
    }
}

fn decode_entry(
    entry: &SchemaEntry,
    json: &Json,
    parent: &str,
) -> Result<ConfigNode, ConfigError> {
    let path = format!("{}/{}", parent, entry.name);
    match &entry.node {
        EntryNode::Container { .. } => {
            let children = decode_children(&[entry], json, &path)?;
            Ok(ConfigNode::container(&entry.name, children))
        }
        EntryNode::List { .. } => {
            let items: &[Json] = match json {
                Json::Array(items) => items.as_slice(),
                Json::Null => &[],
                other => {
                    return Err(json_error(&path, format!("expected array, got {}", other)));
                }
            };
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                let children = decode_children(&[entry], item, &path)?;
                let element = ConfigNode::element(children);
                for key in entry.keys() {
                    if element.child(key).is_none() {
                        let message = format!("list element without key '{}'", key);
                        return Err(json_error(&path, message));
                    }
                }
                elements.push(element);
            }
            Ok(ConfigNode::list(&entry.name, elements))
        }
        EntryNode::Leaf { ty } => {
            let literal = ConfigValue::json_literal(json)
                .ok_or_else(|| json_error(&path, format!("expected scalar, got {}", json)))?;
            Ok(ConfigNode::leaf(&entry.name, ConfigValue::parse(ty, &literal)?))
        }
        EntryNode::LeafList { ty } => {
            let items: &[Json] = match json {
                Json::Array(items) => items.as_slice(),
                other => {
                    return Err(json_error(&path, format!("expected array, got {}", other)));
                }
            };
            let values = items
                .iter()
                .map(|item| {
                    let literal = ConfigValue::json_literal(item).ok_or_else(|| {
                        json_error(&path, format!("expected scalar, got {}", item))
                    })?;
                    ConfigValue::parse(ty, &literal).map_err(ConfigError::from)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConfigNode::leaf_list(&entry.name, values))
        }
        EntryNode::Choice { .. } | EntryNode::Rpc { .. } => Err(ConfigError::UnknownNode {
            path: parent.to_string(),
            name: entry.name.clone(),
        }),
    }
}

/// Decode an object whose members may be declared by any of `entries`.
fn decode_children(
    entries: &[&SchemaEntry],
    json: &Json,
    path: &str,
) -> Result<Vec<ConfigNode>, ConfigError> {
    let map = match json {
        Json::Null => return Ok(Vec::new()),
        Json::Object(map) => map,
        other => return Err(json_error(path, format!("expected object, got {}", other))),
    };
    map.iter()
        .map(|(key, value)| {
            let child = entries
                .iter()
                .find_map(|entry| entry.find_child(unqualified(key)))
                .ok_or_else(|| ConfigError::UnknownNode {
                    path: path.to_string(),
                    name: key.clone(),
                })?;
            decode_entry(child, value, path)
        })
        .collect()
}
