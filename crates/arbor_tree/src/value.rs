//! Priority-ordered values.
//!
//! A [`Node`] is the unit of content everywhere in the tree: an immutable
//! value plus an optional write priority. Children of a mapping-valued
//! node carry their own independent priorities.

use serde_json::Number;
use std::collections::BTreeMap;

/// Write priority attached to a node.
///
/// Priorities order siblings under a common parent: unprioritized nodes
/// sort first, then numeric priorities in numeric order, then named
/// (string) priorities lexicographically.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Priority {
    /// No priority set.
    #[default]
    None,
    /// Numeric priority.
    Number(Number),
    /// String priority.
    Name(String),
}

impl Priority {
    /// Returns true if no priority is set.
    pub fn is_none(&self) -> bool {
        matches!(self, Priority::None)
    }

    /// Creates a numeric priority.
    pub fn number(n: impl Into<Number>) -> Self {
        Priority::Number(n.into())
    }

    /// Creates a named priority.
    pub fn name(name: impl Into<String>) -> Self {
        Priority::Name(name.into())
    }
}

/// The value carried by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value. A null node has no priority and no children.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar. JSON integer/float identity is preserved.
    Number(Number),
    /// String scalar.
    Str(String),
    /// Mapping of key to child node. Never empty: an empty mapping
    /// normalizes to `Null`.
    Children(BTreeMap<String, Node>),
}

/// An immutable value plus its priority.
///
/// Invariant: a null value carries no priority, and a `Children` value is
/// never empty. Both are enforced by the constructors, so consumers can
/// rely on `is_null()` and `children()` without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: Value,
    priority: Priority,
}

impl Node {
    /// Creates a node from a value and priority, normalizing the
    /// null/empty cases.
    pub fn new(value: Value, priority: Priority) -> Self {
        let value = match value {
            Value::Children(map) if map.is_empty() => Value::Null,
            other => other,
        };
        let priority = if matches!(value, Value::Null) {
            Priority::None
        } else {
            priority
        };
        Self { value, priority }
    }

    /// The null node.
    pub fn null() -> Self {
        Self {
            value: Value::Null,
            priority: Priority::None,
        }
    }

    /// Creates a mapping node from child entries.
    pub fn children(map: BTreeMap<String, Node>) -> Self {
        Self::new(Value::Children(map), Priority::None)
    }

    /// Returns this node with the given priority attached.
    ///
    /// Attaching a priority to the null node is a no-op.
    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self::new(self.value, priority)
    }

    /// Returns the value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the priority.
    pub fn priority(&self) -> &Priority {
        &self.priority
    }

    /// Returns true if this is the null node.
    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    /// Returns true if this node has children.
    pub fn has_children(&self) -> bool {
        matches!(self.value, Value::Children(_))
    }

    /// Returns the child map, or None for scalar and null nodes.
    pub fn child_map(&self) -> Option<&BTreeMap<String, Node>> {
        match &self.value {
            Value::Children(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the direct child under `key`, or None.
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.child_map().and_then(|m| m.get(key))
    }

    /// Returns the number of direct children.
    pub fn num_children(&self) -> usize {
        self.child_map().map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::null()
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Self::new(Value::Bool(b), Priority::None)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Self::new(Value::Number(n.into()), Priority::None)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        // Non-finite floats have no JSON form and fall back to null.
        match Number::from_f64(n) {
            Some(num) => Self::new(Value::Number(num), Priority::None),
            None => Self::null(),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::new(Value::Str(s.to_string()), Priority::None)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::new(Value::Str(s), Priority::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_node_has_no_priority() {
        let node = Node::new(Value::Null, Priority::name("ignored"));
        assert!(node.is_null());
        assert!(node.priority().is_none());
    }

    #[test]
    fn empty_children_normalize_to_null() {
        let node = Node::children(BTreeMap::new());
        assert!(node.is_null());
        assert!(!node.has_children());
    }

    #[test]
    fn scalar_keeps_priority() {
        let node = Node::from(42i64).with_priority(Priority::number(7));
        assert_eq!(node.priority(), &Priority::number(7));
        assert!(!node.is_null());
    }

    #[test]
    fn child_lookup() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Node::from(1i64));
        map.insert("b".to_string(), Node::from(2i64));
        let node = Node::children(map);

        assert_eq!(node.num_children(), 2);
        assert_eq!(node.child("a"), Some(&Node::from(1i64)));
        assert_eq!(node.child("missing"), None);
    }

    #[test]
    fn non_finite_float_is_null() {
        assert!(Node::from(f64::NAN).is_null());
        assert!(Node::from(f64::INFINITY).is_null());
    }
}
