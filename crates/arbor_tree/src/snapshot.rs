//! Immutable point-in-time views.

use crate::envelope;
use crate::order::sorted_children;
use crate::path::{Path, PathResult};
use crate::value::{Node, Priority};
use serde_json::Value as JsonValue;

/// A read-only view of one path's content at a point in time.
///
/// Snapshots are detached copies: they never observe later cache merges,
/// and holding one does not pin any engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: Path,
    node: Node,
}

impl Snapshot {
    /// Creates a snapshot of `node` at `path`. `None` (an uncovered or
    /// absent location) snapshots as the null node.
    pub fn new(path: Path, node: Option<Node>) -> Self {
        Self {
            path,
            node: node.unwrap_or_default(),
        }
    }

    /// Returns the path this snapshot was taken at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the final path segment, or None at the root.
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    /// Returns the underlying node.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Returns true if the location held a value.
    pub fn exists(&self) -> bool {
        !self.node.is_null()
    }

    /// Returns the content as plain JSON, priorities stripped. Absent
    /// locations render as null.
    pub fn val(&self) -> JsonValue {
        envelope::value_json(&self.node)
    }

    /// Returns the content in export form, `.value`/`.priority` envelope
    /// included.
    pub fn export_val(&self) -> JsonValue {
        envelope::export(&self.node)
    }

    /// Returns the node's priority.
    pub fn priority(&self) -> &Priority {
        self.node.priority()
    }

    /// Returns true if the content is a mapping.
    pub fn has_children(&self) -> bool {
        self.node.has_children()
    }

    /// Returns the number of direct children.
    pub fn num_children(&self) -> usize {
        self.node.num_children()
    }

    /// Returns child snapshots in sibling order (priority first, then
    /// key). The order is deterministic across repeated snapshots of
    /// unchanged data.
    pub fn children(&self) -> Vec<Snapshot> {
        match self.node.child_map() {
            None => Vec::new(),
            Some(map) => sorted_children(map)
                .into_iter()
                .map(|(key, child)| Snapshot {
                    path: self.path.child_unchecked(key),
                    node: child.clone(),
                })
                .collect(),
        }
    }

    /// Returns a snapshot of a descendant, absent-as-null.
    pub fn child(&self, relative: &str) -> PathResult<Snapshot> {
        let relative = Path::parse(relative)?;
        let mut node = Some(&self.node);
        for segment in relative.segments() {
            node = node.and_then(|n| n.child(segment));
        }
        Ok(Snapshot {
            path: self.path.join(&relative)?,
            node: node.cloned().unwrap_or_default(),
        })
    }
}
