//! Config Tree: the typed configuration document.
//!
//! - `ConfigNode`: container / list / leaf / leaf-list nodes
//! - `ConfigValue`: leaf values discriminated by declared YANG kind
//! - `Path`: a schema-resolved address, rendered as `/mod:name[key='value']`
//! - JSON codec (schema-reconciled or inferred) and canonical diff
//!
//! # Example
//!
//! ```rust
//! use vtyang_config::ConfigNode;
//!
//! let doc = serde_json::json!({"users": {"user": [{"name": "hiroki"}]}});
//! let node = ConfigNode::from_json(&doc).unwrap();
//! assert_eq!(node.to_json(), doc);
//! ```

pub mod diff;
mod error;
mod json;
mod node;
mod path;
mod value;

pub use diff::{Change, DiffEntry};
pub use error::ConfigError;
pub use node::{ConfigNode, NodeData};
pub use path::{Path, PathSegment};
pub use value::ConfigValue;
