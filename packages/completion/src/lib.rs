//! Completion Tree Builder and the line completion engine.
//!
//! [`build`] turns the schema into one subtree per command family,
//! [`CommandTree`] carries the fixed command words of a mode with those
//! subtrees grafted on, and [`Completer`] answers `Tab` and `?` for a line.

mod builder;
mod engine;
mod error;
#[cfg(test)]
mod fixtures;
mod node;
mod tree;

pub use builder::{build, Family};
pub use engine::{Completer, Completion, CompletionItem};
pub use error::CompletionError;
pub use node::{CompletionKind, CompletionNode, CR, NAME, VALUE};
pub use tree::CommandTree;
