//! Structural validation for the write sink.
//!
//! Every write-style entry point validates its input exactly as a live
//! client would (path character rules, reserved locations, envelope
//! shape) and then discards it. Nothing here ever reaches the transport
//! or the cache; a caller cannot tell this apart from a live store that
//! accepted the write and chose to drop it.

use crate::error::{ClientError, ClientResult};
use arbor_tree::{parse, Path, PathError, PRIORITY_KEY, VALUE_KEY};
use serde_json::Value as JsonValue;

/// Rejects writes to locations that are not part of the stored data
/// model. The synthetic `.info` namespace is readable but never writable.
pub(crate) fn check_write_path(path: &Path) -> ClientResult<()> {
    if path.is_info() {
        return Err(ClientError::InvalidPath(PathError::Reserved {
            path: path.to_string(),
        }));
    }
    Ok(())
}

/// Validates a write payload: every map key must be a legal segment (or
/// one of the reserved `.value`/`.priority` pair) and the document must
/// be a well-formed envelope.
pub(crate) fn check_value(value: &JsonValue) -> ClientResult<()> {
    check_keys(value)?;
    parse(value)?;
    Ok(())
}

/// Validates an update patch: an object whose keys are non-empty relative
/// paths (slashes allowed) outside the `.info` namespace, each mapping to
/// a valid write payload.
pub(crate) fn check_update_patch(patch: &JsonValue) -> ClientResult<()> {
    let JsonValue::Object(map) = patch else {
        return Err(ClientError::parse("update patch must be an object"));
    };
    for (key, child) in map {
        let relative = Path::parse(key)?;
        if relative.is_root() {
            return Err(ClientError::InvalidPath(PathError::InvalidSegment {
                segment: key.clone(),
            }));
        }
        if relative.is_info() {
            return Err(ClientError::InvalidPath(PathError::Reserved {
                path: relative.to_string(),
            }));
        }
        check_value(child)?;
    }
    Ok(())
}

/// Validates a raw priority value: null, a number, or a string.
pub(crate) fn check_priority(priority: &JsonValue) -> ClientResult<()> {
    match priority {
        JsonValue::Null | JsonValue::Number(_) | JsonValue::String(_) => Ok(()),
        _ => Err(ClientError::parse(
            "priority must be null, a number, or a string",
        )),
    }
}

fn check_keys(value: &JsonValue) -> ClientResult<()> {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                if key != VALUE_KEY && key != PRIORITY_KEY {
                    check_segment(key)?;
                }
                check_keys(child)?;
            }
            Ok(())
        }
        JsonValue::Array(items) => {
            for item in items {
                check_keys(item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_segment(key: &str) -> ClientResult<()> {
    Path::root().child(key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn info_paths_are_rejected() {
        let err = check_write_path(&Path::info_connected()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidPath(PathError::Reserved { .. })
        ));
        assert!(check_write_path(&Path::parse("users/fred").unwrap()).is_ok());
    }

    #[test]
    fn plain_values_pass() {
        for value in [
            json!(null),
            json!(true),
            json!(42),
            json!("text"),
            json!({"a": 1, "nested": {"b": [1, 2]}}),
        ] {
            assert!(check_value(&value).is_ok(), "{value}");
        }
    }

    #[test]
    fn export_form_payloads_pass() {
        assert!(check_value(&json!({".value": 42, ".priority": "pri"})).is_ok());
        assert!(check_value(&json!({"child": {".priority": 3, "x": 1}})).is_ok());
    }

    #[test]
    fn forbidden_key_characters_fail() {
        for value in [
            json!({"a#b": 1}),
            json!({"pay$load": 1}),
            json!({"nested": {"a[0]": 1}}),
            json!({"dotted.key": 1}),
        ] {
            assert!(matches!(
                check_value(&value),
                Err(ClientError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn malformed_envelope_fails() {
        let err = check_value(&json!({".value": 1, "extra": 2})).unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));

        let err = check_value(&json!({".priority": {"not": "a priority"}})).unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));
    }

    #[test]
    fn update_patch_rules() {
        assert!(check_update_patch(&json!({"a/b": 1, "c": {"d": 2}})).is_ok());

        assert!(matches!(
            check_update_patch(&json!(42)),
            Err(ClientError::Parse { .. })
        ));
        assert!(matches!(
            check_update_patch(&json!({"": 1})),
            Err(ClientError::InvalidPath(_))
        ));
        assert!(matches!(
            check_update_patch(&json!({".info/connected": true})),
            Err(ClientError::InvalidPath(_))
        ));
        assert!(matches!(
            check_update_patch(&json!({"bad#key": 1})),
            Err(ClientError::InvalidPath(_))
        ));
    }

    #[test]
    fn priority_types() {
        assert!(check_priority(&json!(null)).is_ok());
        assert!(check_priority(&json!(5)).is_ok());
        assert!(check_priority(&json!("pri")).is_ok());
        assert!(check_priority(&json!(true)).is_err());
        assert!(check_priority(&json!({})).is_err());
    }
}
