//! # Arbor Tree
//!
//! Priority-ordered value tree for ArborDB.
//!
//! This crate provides:
//! - `Node`: immutable value plus optional priority
//! - `Path`: validated slash-delimited addressing
//! - `CacheTree`: the local cache with last-known-good semantics
//! - `Snapshot`: read-only point-in-time views
//! - Sibling ordering (priority first, then key)
//! - The wire envelope codec (`.value`/`.priority` export form)
//! - Child diffs between successive states
//!
//! This is a pure data crate with no I/O.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod diff;
mod envelope;
mod order;
mod path;
mod snapshot;
mod tree;
mod value;

pub use diff::{diff_children, ChildDiff};
pub use envelope::{export, parse, value_json, EnvelopeError, EnvelopeResult, PRIORITY_KEY, VALUE_KEY};
pub use order::{compare_keys, compare_priorities, compare_siblings, sorted_children};
pub use path::{Path, PathError, PathResult, INFO_SEGMENT};
pub use snapshot::Snapshot;
pub use tree::CacheTree;
pub use value::{Node, Priority, Value};
