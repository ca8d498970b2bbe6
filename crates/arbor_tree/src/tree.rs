//! The local cache tree.

use crate::path::Path;
use crate::value::{Node, Value};
use std::collections::BTreeSet;

/// In-memory hierarchical store of fetched content.
///
/// Content at any path reflects the most recent successful fetch covering
/// that path. The tree distinguishes a path no fetch has covered yet
/// (unknown) from one the remote confirmed absent (explicit null): both
/// render as null to callers, but only the former should trigger
/// unconditional delivery on first fetch.
///
/// The tree performs no I/O and is not synchronized; the engine owns it
/// behind a lock.
#[derive(Debug, Default)]
pub struct CacheTree {
    root: Node,
    covered: BTreeSet<Path>,
}

impl CacheTree {
    /// Creates an empty tree with no covered paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content at `path` with `node` and returns the previous
    /// content.
    ///
    /// Returns `None` when no fetch had covered `path` before, and
    /// `Some(node)` (possibly the null node) when the previous content was
    /// authoritative. The path becomes covered afterward.
    pub fn merge(&mut self, path: &Path, node: Node) -> Option<Node> {
        let previous = self.read(path);

        let root = std::mem::take(&mut self.root);
        self.root = set_at(&root, path.segments(), node);

        // A covered ancestor makes covered descendants redundant.
        self.covered.retain(|existing| !path.contains(existing));
        self.covered.insert(path.clone());

        previous
    }

    /// Returns the current content at `path`.
    ///
    /// `None` means no fetch has covered the path; `Some(null)` means the
    /// remote confirmed it absent.
    pub fn read(&self, path: &Path) -> Option<Node> {
        if !self.is_covered(path) {
            return None;
        }
        Some(self.node_at(path).cloned().unwrap_or_default())
    }

    /// Returns true if a fetch has covered `path` (directly or via an
    /// ancestor).
    pub fn is_covered(&self, path: &Path) -> bool {
        self.covered.iter().any(|c| c.contains(path))
    }

    fn node_at(&self, path: &Path) -> Option<&Node> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.child(segment)?;
        }
        Some(current)
    }
}

fn set_at(current: &Node, segments: &[String], node: Node) -> Node {
    match segments.split_first() {
        None => node,
        Some((head, rest)) => {
            let mut children = current.child_map().cloned().unwrap_or_default();
            let existing = children.remove(head.as_str()).unwrap_or_default();
            let updated = set_at(&existing, rest, node);
            if !updated.is_null() {
                children.insert(head.clone(), updated);
            }
            // A scalar on the way down is displaced by the mapping; the
            // node's own priority survives the rewrite.
            Node::new(Value::Children(children), current.priority().clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Priority;

    fn path(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    #[test]
    fn unknown_path_reads_none() {
        let tree = CacheTree::new();
        assert_eq!(tree.read(&path("users/fred")), None);
        assert!(!tree.is_covered(&path("users/fred")));
    }

    #[test]
    fn first_merge_has_no_previous() {
        let mut tree = CacheTree::new();
        let previous = tree.merge(&path("leaf"), Node::from(42i64));
        assert_eq!(previous, None);
        assert_eq!(tree.read(&path("leaf")), Some(Node::from(42i64)));
    }

    #[test]
    fn remerge_returns_previous_content() {
        let mut tree = CacheTree::new();
        tree.merge(&path("leaf"), Node::from(42i64));
        let previous = tree.merge(&path("leaf"), Node::from("hello"));
        assert_eq!(previous, Some(Node::from(42i64)));
        assert_eq!(tree.read(&path("leaf")), Some(Node::from("hello")));
    }

    #[test]
    fn confirmed_null_is_distinct_from_unknown() {
        let mut tree = CacheTree::new();
        tree.merge(&path("ghost"), Node::null());

        assert_eq!(tree.read(&path("ghost")), Some(Node::null()));
        assert_eq!(tree.read(&path("other")), None);

        // Re-merging null now has an authoritative previous value.
        let previous = tree.merge(&path("ghost"), Node::null());
        assert_eq!(previous, Some(Node::null()));
    }

    #[test]
    fn ancestor_merge_covers_descendants() {
        let mut tree = CacheTree::new();
        let mut children = std::collections::BTreeMap::new();
        children.insert("a".to_string(), Node::from(1i64));
        tree.merge(&path("obj"), Node::children(children));

        assert_eq!(tree.read(&path("obj/a")), Some(Node::from(1i64)));
        // Covered via the ancestor: confirmed absent, not unknown.
        assert_eq!(tree.read(&path("obj/b")), Some(Node::null()));
    }

    #[test]
    fn child_merge_does_not_cover_parent() {
        let mut tree = CacheTree::new();
        tree.merge(&path("obj/a"), Node::from(1i64));

        assert_eq!(tree.read(&path("obj/a")), Some(Node::from(1i64)));
        assert_eq!(tree.read(&path("obj")), None);
    }

    #[test]
    fn deep_merge_displaces_scalar() {
        let mut tree = CacheTree::new();
        tree.merge(&path("spot"), Node::from("scalar"));
        tree.merge(&path("spot/deep"), Node::from(7i64));

        assert_eq!(tree.read(&path("spot/deep")), Some(Node::from(7i64)));
        let spot = tree.read(&path("spot")).unwrap();
        assert!(spot.has_children());
    }

    #[test]
    fn merging_null_prunes_the_branch() {
        let mut tree = CacheTree::new();
        tree.merge(&path("a/b"), Node::from(1i64));
        tree.merge(&path("a/b"), Node::null());

        assert_eq!(tree.read(&path("a/b")), Some(Node::null()));
        // The parent collapses once its only child is gone.
        assert_eq!(tree.read(&path("a")), None);
    }

    #[test]
    fn covered_set_collapses_under_ancestor() {
        let mut tree = CacheTree::new();
        tree.merge(&path("a/b"), Node::from(1i64));
        tree.merge(&path("a/c"), Node::from(2i64));
        tree.merge(&path("a"), Node::from(3i64));

        assert_eq!(tree.covered.len(), 1);
        assert!(tree.is_covered(&path("a/b")));
    }

    #[test]
    fn merge_preserves_priorities() {
        let mut tree = CacheTree::new();
        let node = Node::from(42i64).with_priority(Priority::name("pri"));
        tree.merge(&path("leaf"), node.clone());
        assert_eq!(tree.read(&path("leaf")), Some(node));
    }
}
