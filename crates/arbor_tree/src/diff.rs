//! Structural diffs between successive node states.
//!
//! The poll cycle compares the previous cached content of a path with the
//! freshly fetched content. Value listeners only need to know that the two
//! differ; child listeners need the per-key breakdown this module
//! produces.

use crate::order::sorted_children;
use crate::value::Node;

/// Per-key changes between two states of a mapping node.
///
/// `added`, `changed`, and `moved` follow the new node's sibling order;
/// `removed` follows the old one's. A key lands in `moved` when it
/// survives with a different priority, the only way a sibling changes
/// position while its content stays comparable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildDiff {
    /// Keys present only in the new state.
    pub added: Vec<String>,
    /// Keys present in both states whose value differs.
    pub changed: Vec<String>,
    /// Keys present only in the old state.
    pub removed: Vec<String>,
    /// Keys present in both states whose priority differs.
    pub moved: Vec<String>,
}

impl ChildDiff {
    /// Returns true when the two states had identical children.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.changed.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
    }
}

/// Computes the child diff from `previous` to `next`.
///
/// `previous` of `None` (a path never covered before) diffs like the null
/// node: every child of `next` is an addition.
pub fn diff_children(previous: Option<&Node>, next: &Node) -> ChildDiff {
    let empty = std::collections::BTreeMap::new();
    let old_map = previous.and_then(Node::child_map).unwrap_or(&empty);
    let new_map = next.child_map().unwrap_or(&empty);

    let mut diff = ChildDiff::default();

    for (key, new_child) in sorted_children(new_map) {
        match old_map.get(key) {
            None => diff.added.push(key.clone()),
            Some(old_child) => {
                if old_child.value() != new_child.value() {
                    diff.changed.push(key.clone());
                }
                if old_child.priority() != new_child.priority() {
                    diff.moved.push(key.clone());
                }
            }
        }
    }

    for (key, _) in sorted_children(old_map) {
        if !new_map.contains_key(key) {
            diff.removed.push(key.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::parse;
    use serde_json::json;

    fn node(raw: serde_json::Value) -> Node {
        parse(&raw).unwrap()
    }

    #[test]
    fn uncovered_previous_adds_everything() {
        let next = node(json!({"a": 1, "b": 2}));
        let diff = diff_children(None, &next);
        assert_eq!(diff.added, ["a", "b"]);
        assert!(diff.changed.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn identical_states_are_empty() {
        let prev = node(json!({"a": 1}));
        let next = node(json!({"a": 1}));
        assert!(diff_children(Some(&prev), &next).is_empty());
    }

    #[test]
    fn value_change_is_changed_not_moved() {
        let prev = node(json!({"a": 1, "b": 2}));
        let next = node(json!({"a": 9, "b": 2}));
        let diff = diff_children(Some(&prev), &next);
        assert_eq!(diff.changed, ["a"]);
        assert!(diff.moved.is_empty());
    }

    #[test]
    fn priority_change_is_moved_not_changed() {
        let prev = node(json!({"a": {".value": 1, ".priority": 5}}));
        let next = node(json!({"a": {".value": 1, ".priority": 9}}));
        let diff = diff_children(Some(&prev), &next);
        assert!(diff.changed.is_empty());
        assert_eq!(diff.moved, ["a"]);
    }

    #[test]
    fn removal_and_addition() {
        let prev = node(json!({"a": 1, "b": 2}));
        let next = node(json!({"b": 2, "c": 3}));
        let diff = diff_children(Some(&prev), &next);
        assert_eq!(diff.added, ["c"]);
        assert_eq!(diff.removed, ["a"]);
    }

    #[test]
    fn scalar_states_diff_as_childless() {
        let prev = node(json!(42));
        let next = node(json!({"a": 1}));
        let diff = diff_children(Some(&prev), &next);
        assert_eq!(diff.added, ["a"]);

        let back = diff_children(Some(&next), &node(json!(42)));
        assert_eq!(back.removed, ["a"]);
    }

    #[test]
    fn added_keys_follow_sibling_order() {
        let next = node(json!({
            "10": {".value": 1, ".priority": 22},
            "20": {".value": 2, ".priority": 52},
            "30": {".value": 3, ".priority": 23},
        }));
        let diff = diff_children(None, &next);
        assert_eq!(diff.added, ["10", "30", "20"]);
    }
}
