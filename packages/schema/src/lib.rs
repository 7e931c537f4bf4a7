//! Schema Index: a read-only view over compiled YANG modules.
//!
//! Modules are read from JSON documents (the compiled form of a YANG module)
//! and finalized once at startup:
//! - `SchemaEntry`: container / list / leaf / leaf-list / choice / rpc nodes
//! - `TypeDescriptor`: base kind plus enum, identity, union, range and pattern restrictions
//! - `validate`: checks literals against a type descriptor
//!
//! Choice and case nodes are never addressed directly. Every consumer walks
//! data children through [`SchemaEntry::addressable_children`], which
//! promotes case children into the enclosing node.

mod entry;
mod error;
mod index;
mod types;
pub mod validate;

pub use entry::{AddressableChildren, EntryNode, NodeKind, SchemaCase, SchemaEntry};
pub use error::SchemaError;
pub use index::{IdentityDef, SchemaIndex, SchemaModule};
pub use types::{parse_scaled, Identity, NumericRange, TypeDescriptor, TypeKind};
pub use validate::{resolve_member, validate, ValidationError};
