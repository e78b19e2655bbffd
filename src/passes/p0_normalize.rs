//! Pass 0: Version Normalization (3.1 → 3.0)
//!
//! OpenAPI 3.1 schemas follow the JSON Schema 2020-12 dialect; 3.0 uses a
//! restricted draft-4 flavor. This pass rewrites 3.1-only constructs into
//! 3.0-compatible shapes so the structural converter only ever sees one
//! dialect:
//!
//! 1. `openapi: 3.1.x` → `3.0.3`, `jsonSchemaDialect` dropped
//! 2. `examples[0]` → `example` backfill
//! 3. 2020-12-only keywords bucketed under `x-oas31-unsupported`
//! 4. `type` arrays collapsed (`"null"` → `nullable: true`)
//! 5. `const` → single-value `enum`
//! 6. numeric `exclusiveMinimum`/`exclusiveMaximum` → bound + boolean flag
//!
//! A no-op for any document whose `openapi` does not start with `3.1`.

use serde_json::{json, Map, Value};

use crate::walker;
use crate::warning::Warnings;

/// JSON Schema 2020-12 keywords with no OpenAPI 3.0 counterpart.
/// Shared with the strict sanitizer, which strips them outright.
pub(crate) const OAS31_UNSUPPORTED: &[&str] = &[
    "$schema",
    "$id",
    "anchor",
    "defs",
    "$defs",
    "if",
    "then",
    "else",
    "dependentSchemas",
    "dependentRequired",
    "unevaluatedItems",
    "unevaluatedProperties",
    "propertyNames",
    "patternProperties",
    "contains",
    "minContains",
    "maxContains",
    "prefixItems",
    "contentEncoding",
    "contentMediaType",
    "contentSchema",
    "examples",
];

/// Normalize a 3.1 document in place. Non-3.1 input is left untouched.
pub fn normalize(doc: &mut Value, warnings: &mut Warnings) {
    let is_31 = doc
        .get("openapi")
        .and_then(Value::as_str)
        .is_some_and(|v| v.starts_with("3.1"));
    if !is_31 {
        return;
    }

    if let Some(root) = doc.as_object_mut() {
        root.insert("openapi".to_string(), json!("3.0.3"));
        root.remove("jsonSchemaDialect");
    }

    walker::walk_schemas(doc, &mut |schema, path| {
        normalize_schema(schema, path, warnings);
    });
}

/// Apply all 3.1 → 3.0 rewrites to a single schema node.
fn normalize_schema(schema: &mut Value, path: &str, warnings: &mut Warnings) {
    let Some(obj) = schema.as_object_mut() else {
        return;
    };

    backfill_example(obj);
    bucket_unsupported_keywords(obj, path, warnings);
    collapse_type_array(obj, path, warnings);
    rewrite_const(obj, path, warnings);
    rewrite_exclusive_bound(obj, "exclusiveMinimum", "minimum", path, warnings);
    rewrite_exclusive_bound(obj, "exclusiveMaximum", "maximum", path, warnings);
}

/// Copy `examples[0]` into `example` when `example` is absent. The
/// `examples` array itself is removed by the unsupported-keyword bucket.
fn backfill_example(obj: &mut Map<String, Value>) {
    if obj.contains_key("example") {
        return;
    }
    let first = obj
        .get("examples")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .cloned();
    if let Some(first) = first {
        obj.insert("example".to_string(), first);
    }
}

/// Move every 2020-12-only keyword into an `x-oas31-unsupported` bucket,
/// added only when at least one such keyword was present.
fn bucket_unsupported_keywords(obj: &mut Map<String, Value>, path: &str, warnings: &mut Warnings) {
    let mut bucket = Map::new();
    for keyword in OAS31_UNSUPPORTED {
        if let Some(value) = obj.remove(*keyword) {
            bucket.insert((*keyword).to_string(), value);
        }
    }
    if bucket.is_empty() {
        return;
    }
    let names: Vec<&str> = bucket.keys().map(String::as_str).collect();
    warnings.push(
        path,
        format!(
            "unsupported JSON Schema 2020-12 keywords moved to x-oas31-unsupported: {}",
            names.join(", ")
        ),
    );
    obj.insert("x-oas31-unsupported".to_string(), Value::Object(bucket));
}

/// Collapse a 2020-12 `type` array into a single scalar plus `nullable`.
fn collapse_type_array(obj: &mut Map<String, Value>, path: &str, warnings: &mut Warnings) {
    let Some(Value::Array(types)) = obj.get("type") else {
        return;
    };
    let had_null = types.iter().any(|t| t.as_str() == Some("null"));
    let rest: Vec<Value> = types
        .iter()
        .filter(|t| t.as_str() != Some("null"))
        .cloned()
        .collect();

    if had_null && !obj.contains_key("nullable") {
        obj.insert("nullable".to_string(), Value::Bool(true));
    }

    match rest.len() {
        0 => {
            obj.remove("type");
            warnings.push(path, "type array contained no usable entries; type removed");
        }
        1 => {
            obj.insert("type".to_string(), rest.into_iter().next().unwrap_or(Value::Null));
        }
        _ => {
            let mut rest = rest;
            let first = rest.remove(0);
            obj.insert("type".to_string(), first);
            obj.insert("x-type-alternatives".to_string(), Value::Array(rest));
            warnings.push(
                path,
                "type array collapsed to its first entry; remainder kept in x-type-alternatives",
            );
        }
    }
}

/// `const: v` → `enum: [v]` (unless an `enum` already exists).
fn rewrite_const(obj: &mut Map<String, Value>, path: &str, warnings: &mut Warnings) {
    let Some(value) = obj.remove("const") else {
        return;
    };
    if !obj.contains_key("enum") {
        obj.insert("enum".to_string(), Value::Array(vec![value]));
    }
    warnings.push(path, "const converted to single-value enum");
}

/// 2020-12 numeric exclusive bounds become a draft-4 bound plus a boolean
/// exclusivity flag. Warns when this silently overwrites a differing bound.
fn rewrite_exclusive_bound(
    obj: &mut Map<String, Value>,
    exclusive_key: &str,
    bound_key: &str,
    path: &str,
    warnings: &mut Warnings,
) {
    if !obj.get(exclusive_key).is_some_and(Value::is_number) {
        return;
    }
    let Some(bound) = obj.remove(exclusive_key) else {
        return;
    };
    if let Some(existing) = obj.get(bound_key) {
        if *existing != bound {
            warnings.push(
                path,
                format!("{exclusive_key} rewrite overwrote a differing {bound_key} value"),
            );
        }
    }
    obj.insert(bound_key.to_string(), bound);
    obj.insert(exclusive_key.to_string(), Value::Bool(true));
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(doc: Value) -> (Value, Vec<crate::warning::Warning>) {
        let mut doc = doc;
        let mut warnings = Warnings::new(true);
        normalize(&mut doc, &mut warnings);
        (doc, warnings.into_vec())
    }

    fn doc_with_schema(schema: Value) -> Value {
        json!({
            "openapi": "3.1.0",
            "components": {"schemas": {"S": schema}}
        })
    }

    #[test]
    fn test_non_31_input_untouched() {
        let doc = json!({
            "openapi": "3.0.2",
            "components": {"schemas": {"S": {"type": ["string", "null"]}}}
        });
        let (out, warnings) = run(doc.clone());
        assert_eq!(out, doc);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_version_rewritten_and_dialect_dropped() {
        let (out, _) = run(json!({
            "openapi": "3.1.1",
            "jsonSchemaDialect": "https://json-schema.org/draft/2020-12/schema"
        }));
        assert_eq!(out["openapi"], json!("3.0.3"));
        assert!(out.get("jsonSchemaDialect").is_none());
    }

    #[test]
    fn test_type_array_with_null() {
        let (out, _) = run(doc_with_schema(json!({"type": ["string", "null"]})));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["type"], json!("string"));
        assert_eq!(s["nullable"], json!(true));
    }

    #[test]
    fn test_type_array_multiple_remainder() {
        let (out, warnings) =
            run(doc_with_schema(json!({"type": ["string", "integer", "null"]})));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["type"], json!("string"));
        assert_eq!(s["x-type-alternatives"], json!(["integer"]));
        assert_eq!(s["nullable"], json!(true));
        assert!(warnings.iter().any(|w| w.message.contains("x-type-alternatives")));
    }

    #[test]
    fn test_type_array_only_null() {
        let (out, warnings) = run(doc_with_schema(json!({"type": ["null"]})));
        let s = &out["components"]["schemas"]["S"];
        assert!(s.get("type").is_none());
        assert_eq!(s["nullable"], json!(true));
        assert!(warnings.iter().any(|w| w.message.contains("type removed")));
    }

    #[test]
    fn test_existing_nullable_not_overwritten() {
        let (out, _) = run(doc_with_schema(
            json!({"type": ["string", "null"], "nullable": false}),
        ));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["nullable"], json!(false));
    }

    #[test]
    fn test_const_becomes_enum() {
        let (out, warnings) = run(doc_with_schema(json!({"type": "string", "const": "fixed"})));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["enum"], json!(["fixed"]));
        assert!(s.get("const").is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_const_with_existing_enum_just_dropped() {
        let (out, _) = run(doc_with_schema(json!({"const": "a", "enum": ["a", "b"]})));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["enum"], json!(["a", "b"]));
        assert!(s.get("const").is_none());
    }

    #[test]
    fn test_numeric_exclusive_bounds() {
        let (out, _) = run(doc_with_schema(json!({
            "type": "integer",
            "exclusiveMinimum": 0,
            "exclusiveMaximum": 100
        })));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["minimum"], json!(0));
        assert_eq!(s["exclusiveMinimum"], json!(true));
        assert_eq!(s["maximum"], json!(100));
        assert_eq!(s["exclusiveMaximum"], json!(true));
    }

    #[test]
    fn test_exclusive_bound_overwrite_warns() {
        let (out, warnings) = run(doc_with_schema(json!({
            "type": "integer",
            "minimum": 5,
            "exclusiveMinimum": 0
        })));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["minimum"], json!(0));
        assert!(warnings.iter().any(|w| w.message.contains("overwrote")));
    }

    #[test]
    fn test_unsupported_keywords_bucketed() {
        let (out, warnings) = run(doc_with_schema(json!({
            "type": "string",
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "patternProperties": {"^x": {}},
            "contentEncoding": "base64"
        })));
        let s = &out["components"]["schemas"]["S"];
        assert!(s.get("$schema").is_none());
        assert!(s.get("patternProperties").is_none());
        let bucket = s["x-oas31-unsupported"].as_object().unwrap();
        assert_eq!(bucket.len(), 3);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_examples_first_entry_becomes_example() {
        let (out, _) = run(doc_with_schema(json!({
            "type": "string",
            "examples": ["first", "second"]
        })));
        let s = &out["components"]["schemas"]["S"];
        assert_eq!(s["example"], json!("first"));
        // examples array lands in the unsupported bucket
        assert_eq!(s["x-oas31-unsupported"]["examples"], json!(["first", "second"]));
    }

    #[test]
    fn test_no_bucket_when_nothing_unsupported() {
        let (out, _) = run(doc_with_schema(json!({"type": "string"})));
        assert!(out["components"]["schemas"]["S"]
            .get("x-oas31-unsupported")
            .is_none());
    }
}
