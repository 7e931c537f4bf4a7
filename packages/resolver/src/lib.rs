//! Path Resolver: maps CLI tokens and bracketed path strings onto the schema.
//!
//! Both entry points share one lookup, where choice/case nodes are
//! transparent. Values are validated here so that a failed command never
//! reaches the config tree.

mod enumerate;
mod error;
#[cfg(test)]
mod fixtures;
mod resolver;
mod tokenize;

pub use enumerate::enumerate_values;
pub use error::ResolveError;
pub use resolver::{Backtracked, ResolveMode, Resolved, Resolver};
pub use tokenize::{tokenize, RawSegment};
