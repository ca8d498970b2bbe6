//! Wire envelope codec.
//!
//! The remote store serves subtrees as JSON in export form: a bare scalar
//! or mapping means a value with no priority, while an object carrying the
//! reserved `.value`/`.priority` keys wraps a prioritized value. Children
//! of a mapping may themselves carry `.priority` entries. Parsing resolves
//! the shape once, up front, so consumers only ever see [`Node`]s.

use crate::order::sorted_children;
use crate::value::{Node, Priority, Value};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved key holding a wrapped value.
pub const VALUE_KEY: &str = ".value";

/// Reserved key holding a priority.
pub const PRIORITY_KEY: &str = ".priority";

/// Errors from envelope parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// A `.priority` entry was neither null, a number, nor a string.
    #[error("invalid priority: expected number or string, found {found}")]
    InvalidPriority {
        /// JSON type of the offending entry.
        found: &'static str,
    },

    /// A `.value` wrapper carried keys other than `.value`/`.priority`.
    #[error("malformed value wrapper: unexpected key {key:?}")]
    MalformedWrapper {
        /// The unexpected key.
        key: String,
    },
}

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Parses an export-form JSON document into a node.
///
/// A JSON `null` parses to the null node, the remote's way of confirming
/// a path absent. Arrays parse as mappings keyed by index, the form the
/// remote uses for list-like data.
pub fn parse(json: &JsonValue) -> EnvelopeResult<Node> {
    match json {
        JsonValue::Null => Ok(Node::null()),
        JsonValue::Bool(b) => Ok(Node::from(*b)),
        JsonValue::Number(n) => Ok(Node::new(Value::Number(n.clone()), Priority::None)),
        JsonValue::String(s) => Ok(Node::from(s.as_str())),
        JsonValue::Array(items) => parse_array(items),
        JsonValue::Object(map) => parse_object(map),
    }
}

fn parse_array(items: &[JsonValue]) -> EnvelopeResult<Node> {
    let mut children = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        let child = parse(item)?;
        if !child.is_null() {
            children.insert(index.to_string(), child);
        }
    }
    Ok(Node::children(children))
}

fn parse_object(map: &Map<String, JsonValue>) -> EnvelopeResult<Node> {
    let priority = match map.get(PRIORITY_KEY) {
        Some(raw) => parse_priority(raw)?,
        None => Priority::None,
    };

    if let Some(inner) = map.get(VALUE_KEY) {
        if let Some(key) = map
            .keys()
            .find(|k| k.as_str() != VALUE_KEY && k.as_str() != PRIORITY_KEY)
        {
            return Err(EnvelopeError::MalformedWrapper { key: key.clone() });
        }
        return Ok(parse(inner)?.with_priority(priority));
    }

    let mut children = BTreeMap::new();
    for (key, raw) in map {
        if key == PRIORITY_KEY {
            continue;
        }
        let child = parse(raw)?;
        if !child.is_null() {
            children.insert(key.clone(), child);
        }
    }
    Ok(Node::children(children).with_priority(priority))
}

fn parse_priority(raw: &JsonValue) -> EnvelopeResult<Priority> {
    match raw {
        JsonValue::Null => Ok(Priority::None),
        JsonValue::Number(n) => Ok(Priority::Number(n.clone())),
        JsonValue::String(s) => Ok(Priority::Name(s.clone())),
        other => Err(EnvelopeError::InvalidPriority {
            found: json_type_name(other),
        }),
    }
}

/// Exports a node back to export-form JSON, priorities included.
///
/// Children are emitted in sibling order, so the document is stable
/// across repeated exports of unchanged data.
pub fn export(node: &Node) -> JsonValue {
    let plain = match node.value() {
        Value::Null => return JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => JsonValue::Number(n.clone()),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Children(children) => {
            let mut out = Map::new();
            if let Some(raw) = priority_json(node.priority()) {
                out.insert(PRIORITY_KEY.to_string(), raw);
            }
            for (key, child) in sorted_children(children) {
                out.insert(key.clone(), export(child));
            }
            return JsonValue::Object(out);
        }
    };

    match priority_json(node.priority()) {
        None => plain,
        Some(raw) => {
            let mut out = Map::new();
            out.insert(VALUE_KEY.to_string(), plain);
            out.insert(PRIORITY_KEY.to_string(), raw);
            JsonValue::Object(out)
        }
    }
}

/// Renders a node as plain JSON, priorities stripped.
///
/// Children are emitted in sibling order.
pub fn value_json(node: &Node) -> JsonValue {
    match node.value() {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => JsonValue::Number(n.clone()),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Children(children) => {
            let mut out = Map::new();
            for (key, child) in sorted_children(children) {
                out.insert(key.clone(), value_json(child));
            }
            JsonValue::Object(out)
        }
    }
}

fn priority_json(priority: &Priority) -> Option<JsonValue> {
    match priority {
        Priority::None => None,
        Priority::Number(n) => Some(JsonValue::Number(n.clone())),
        Priority::Name(s) => Some(JsonValue::String(s.clone())),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_scalar_has_no_priority() {
        let node = parse(&json!(42)).unwrap();
        assert_eq!(node.value(), &Value::Number(42.into()));
        assert!(node.priority().is_none());
        assert_eq!(export(&node), json!(42));
    }

    #[test]
    fn null_parses_to_null_node() {
        assert!(parse(&json!(null)).unwrap().is_null());
    }

    #[test]
    fn wrapped_leaf_round_trips() {
        let doc = json!({".value": 42, ".priority": "pri"});
        let node = parse(&doc).unwrap();
        assert_eq!(node.value(), &Value::Number(42.into()));
        assert_eq!(node.priority(), &Priority::name("pri"));
        assert_eq!(export(&node), doc);
    }

    #[test]
    fn mapping_with_child_priorities() {
        let doc = json!({
            "10": {"name": "amy", ".priority": 22},
            "20": {"name": "becky", ".priority": 52},
            "30": {"name": "fred", ".priority": 23},
        });
        let node = parse(&doc).unwrap();
        assert_eq!(node.num_children(), 3);
        assert_eq!(
            node.child("10").unwrap().priority(),
            &Priority::number(22)
        );

        // Export orders children by priority: 22, 23, 52.
        let exported = export(&node);
        let keys: Vec<_> = exported.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["10", "30", "20"]);
    }

    #[test]
    fn mapping_priority_applies_to_the_mapping() {
        let doc = json!({"a": 1, ".priority": 5});
        let node = parse(&doc).unwrap();
        assert_eq!(node.priority(), &Priority::number(5));
        assert_eq!(node.num_children(), 1);
    }

    #[test]
    fn null_children_are_dropped() {
        let node = parse(&json!({"a": null, "b": 2})).unwrap();
        assert_eq!(node.num_children(), 1);
        assert!(node.child("a").is_none());
    }

    #[test]
    fn array_parses_as_indexed_mapping() {
        let node = parse(&json!(["x", null, "z"])).unwrap();
        assert_eq!(node.num_children(), 2);
        assert_eq!(node.child("0"), Some(&Node::from("x")));
        assert_eq!(node.child("2"), Some(&Node::from("z")));
    }

    #[test]
    fn bad_priority_type_is_an_error() {
        let err = parse(&json!({".value": 1, ".priority": true})).unwrap_err();
        assert_eq!(err, EnvelopeError::InvalidPriority { found: "boolean" });
    }

    #[test]
    fn wrapper_with_foreign_key_is_an_error() {
        let err = parse(&json!({".value": 1, "extra": 2})).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedWrapper { .. }));
    }

    #[test]
    fn value_json_strips_priorities() {
        let doc = json!({
            "leaf": {".value": 42, ".priority": "pri"},
            "plain": "text",
        });
        let node = parse(&doc).unwrap();
        assert_eq!(
            value_json(&node),
            json!({"leaf": 42, "plain": "text"})
        );
    }

    #[test]
    fn wrapped_null_collapses() {
        let node = parse(&json!({".value": null, ".priority": 3})).unwrap();
        assert!(node.is_null());
        assert!(node.priority().is_none());
    }
}
