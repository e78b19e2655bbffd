//! Local `$ref` resolution against the document root.
//!
//! Two entry points with deliberately different failure behavior:
//!
//! - [`resolve_cloned`] is the primary path used by the structural
//!   converter. A non-local reference is a hard error — the pipeline
//!   assumes all remote refs were bundled into local ones before entry.
//!   A local pointer whose target is missing yields `Ok(None)` and the
//!   caller decides what to do.
//! - [`lookup`] is the forgiving variant used by the sanitizer, the
//!   discriminator-mapping resolution and the dereferencer. It returns
//!   `None` on *any* failure, including external refs and non-object
//!   intermediates, and never errors.

use serde_json::Value;

use crate::error::ConvertError;
use crate::pointer;

/// Extract the `$ref` string from a node, if present.
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Resolve `node` against `root`, cloning the target.
///
/// - No `$ref` on the node → a clone of the node itself.
/// - Local `$ref` → a clone of the target, or `Ok(None)` when any
///   intermediate key is missing.
/// - Non-local `$ref` → [`ConvertError::ExternalReference`].
pub fn resolve_cloned(root: &Value, node: &Value) -> Result<Option<Value>, ConvertError> {
    let Some(reference) = ref_of(node) else {
        return Ok(Some(node.clone()));
    };
    let Some(ptr) = pointer::as_json_pointer(reference) else {
        return Err(ConvertError::ExternalReference {
            reference: reference.to_string(),
        });
    };
    Ok(root.pointer(ptr).cloned())
}

/// Pure pointer lookup: `None` on any failure, never an error.
pub fn lookup<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    root.pointer(pointer::as_json_pointer(reference)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_resolve_without_ref_passes_through() {
        let root = json!({});
        let node = json!({"type": "string"});
        let resolved = resolve_cloned(&root, &node).unwrap();
        assert_eq!(resolved, Some(json!({"type": "string"})));
    }

    #[test]
    fn test_resolve_local_pointer() {
        let root = json!({
            "components": {
                "schemas": {
                    "Pet": {"type": "object"}
                }
            }
        });
        let node = json!({"$ref": "#/components/schemas/Pet"});
        let resolved = resolve_cloned(&root, &node).unwrap();
        assert_eq!(resolved, Some(json!({"type": "object"})));
    }

    #[test]
    fn test_resolve_escaped_segments() {
        let root = json!({
            "paths": {
                "/pets/{id}": {"get": {}},
                "a~b": {"x": 1}
            }
        });
        assert_eq!(
            lookup(&root, "#/paths/~1pets~1{id}/get"),
            Some(&json!({}))
        );
        assert_eq!(lookup(&root, "#/paths/a~0b/x"), Some(&json!(1)));
    }

    #[test]
    fn test_resolve_missing_target_is_none() {
        let root = json!({"components": {}});
        let node = json!({"$ref": "#/components/schemas/Gone"});
        assert_eq!(resolve_cloned(&root, &node).unwrap(), None);
    }

    #[test]
    fn test_external_ref_is_fatal() {
        let root = json!({});
        let node = json!({"$ref": "https://example.com/pet.json#/Pet"});
        let err = resolve_cloned(&root, &node).unwrap_err();
        match err {
            ConvertError::ExternalReference { reference } => {
                assert!(reference.starts_with("https://"));
            }
            other => panic!("expected ExternalReference, got: {other:?}"),
        }
    }

    #[test]
    fn test_lookup_never_errors() {
        let root = json!({"a": "scalar"});
        // External ref, missing key, non-object intermediate — all None.
        assert_eq!(lookup(&root, "http://x/#/a"), None);
        assert_eq!(lookup(&root, "#/missing"), None);
        assert_eq!(lookup(&root, "#/a/deeper"), None);
    }
}
