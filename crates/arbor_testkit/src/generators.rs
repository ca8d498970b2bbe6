//! Property-based test generators using proptest.
//!
//! Strategies produce valid paths and export-form documents, maintaining
//! the invariants the client expects from a well-behaved remote.

use arbor_client::Path;
use proptest::prelude::*;
use serde_json::{Map, Value as JsonValue};

/// Strategy for valid path segments.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_-]{1,10}").expect("Invalid regex")
}

/// Strategy for valid (non-`.info`) paths, up to four segments deep.
pub fn path_strategy() -> impl Strategy<Value = Path> {
    prop::collection::vec(segment_strategy(), 0..4).prop_map(|segments| {
        Path::parse(&segments.join("/")).expect("generated segments are valid")
    })
}

/// Strategy for raw priority values (null, number, or string).
pub fn priority_strategy() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<i32>().prop_map(|n| JsonValue::from(i64::from(n))),
        "[a-z]{1,8}".prop_map(JsonValue::String),
    ]
}

/// Strategy for plain JSON documents (no reserved keys).
pub fn document_strategy() -> impl Strategy<Value = JsonValue> {
    let scalar = prop_oneof![
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i64>().prop_map(JsonValue::from),
        "[a-z]{0,10}".prop_map(JsonValue::String),
    ];
    scalar.prop_recursive(3, 20, 4, |inner| {
        prop::collection::btree_map(segment_strategy(), inner, 1..4)
            .prop_map(|map| JsonValue::Object(map.into_iter().collect()))
    })
}

/// Strategy for export-form documents: plain documents with a priority
/// attached the way the wire envelope carries one.
pub fn export_document_strategy() -> impl Strategy<Value = JsonValue> {
    (document_strategy(), priority_strategy()).prop_map(|(document, priority)| {
        if priority.is_null() {
            return document;
        }
        match document {
            JsonValue::Object(mut map) => {
                map.insert(".priority".to_string(), priority);
                JsonValue::Object(map)
            }
            scalar => {
                let mut map = Map::new();
                map.insert(".value".to_string(), scalar);
                map.insert(".priority".to_string(), priority);
                JsonValue::Object(map)
            }
        }
    })
}
