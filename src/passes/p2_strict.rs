//! Pass 2: Strict draft-4 Sanitization
//!
//! Swagger 2.0 validators reject keywords the earlier passes tolerate.
//! This pass walks the entire document, detects schema-like nodes, and
//! enforces draft-4 validity:
//!
//! 1. optional `x-` extension stripping
//! 2. bare `example`/`examples` removal
//! 3. cycle-safe `allOf` flattening into a single merged schema
//! 4. dangling `.../allOf/<n>` ref repair (left behind by flattening)
//! 5. stripping of 2020-12 leftovers plus `oneOf`/`anyOf`/`not`/`const`/
//!    `nullable`/`deprecated`/`writeOnly`
//! 6. boolean `additionalProperties` removal
//! 7. missing `type` backfill (`object`/`array` from shape evidence)
//!
//! The pass runs twice: flattening one schema can expose an `allOf` chain
//! behind a ref that the first pass already walked past. Flattening against
//! a cyclic `allOf` graph terminates via an active-pointer set; a flatten
//! that cannot resolve all members leaves the `allOf` intact (still valid
//! JSON Schema, just not minimal).

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::ConvertOptions;
use crate::passes::p0_normalize::OAS31_UNSUPPORTED;
use crate::pointer::join;
use crate::resolver;

/// Keywords stripped from every schema-like node, beyond the 2020-12 set.
const STRICT_STRIP: &[&str] = &[
    "oneOf",
    "anyOf",
    "not",
    "const",
    "nullable",
    "deprecated",
    "writeOnly",
];

fn dangling_all_of_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/allOf/\d+$").expect("static regex"))
}

/// Sanitize the whole document in place. Always two full passes.
pub fn sanitize(doc: &mut Value, options: &ConvertOptions) {
    for _ in 0..2 {
        let frozen = doc.clone();
        let mut active = HashSet::new();
        sanitize_node(doc, "#", &frozen, options, &mut active);
    }
}

fn sanitize_node(
    value: &mut Value,
    path: &str,
    frozen: &Value,
    options: &ConvertOptions,
    active: &mut HashSet<String>,
) {
    match value {
        Value::Object(obj) => {
            if is_schema_like(obj) {
                fix_schema(obj, path, frozen, options, active);
            }
            for (key, child) in obj.iter_mut() {
                let child_path = join(path, &[key]);
                sanitize_node(child, &child_path, frozen, options, active);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                let child_path = join(path, &[&i.to_string()]);
                sanitize_node(item, &child_path, frozen, options, active);
            }
        }
        _ => {}
    }
}

/// Heuristic for "this map is a schema": any schema-defining keyword, or a
/// truthy `additionalProperties` (boolean `false` and `{}` don't count).
fn is_schema_like(obj: &Map<String, Value>) -> bool {
    const MARKERS: &[&str] = &[
        "$ref",
        "type",
        "format",
        "properties",
        "items",
        "allOf",
        "anyOf",
        "oneOf",
        "enum",
        "discriminator",
    ];
    if MARKERS.iter().any(|key| obj.contains_key(*key)) {
        return true;
    }
    match obj.get("additionalProperties") {
        Some(Value::Bool(true)) => true,
        Some(Value::Object(map)) => !map.is_empty(),
        _ => false,
    }
}

fn fix_schema(
    obj: &mut Map<String, Value>,
    path: &str,
    frozen: &Value,
    options: &ConvertOptions,
    active: &mut HashSet<String>,
) {
    if options.strip_extensions {
        obj.retain(|key, _| !key.starts_with("x-"));
    }

    obj.remove("example");
    obj.remove("examples");

    let has_all_of = matches!(obj.get("allOf"), Some(Value::Array(members)) if !members.is_empty());
    if has_all_of {
        flatten_all_of(obj, path, frozen, active);
    }

    repair_dangling_ref(obj, frozen);

    for keyword in OAS31_UNSUPPORTED.iter().chain(STRICT_STRIP) {
        obj.remove(*keyword);
    }

    if obj.get("additionalProperties").is_some_and(Value::is_boolean) {
        obj.remove("additionalProperties");
    }

    backfill_type(obj);
}

/// `#/definitions/Foo/allOf/0` refs stop resolving once `Foo` is
/// flattened; strip the trailing segment when the shorter pointer works.
fn repair_dangling_ref(obj: &mut Map<String, Value>, frozen: &Value) {
    let Some(reference) = obj.get("$ref").and_then(Value::as_str) else {
        return;
    };
    if !dangling_all_of_re().is_match(reference) {
        return;
    }
    let stripped = dangling_all_of_re().replace(reference, "").into_owned();
    if resolver::lookup(frozen, &stripped).is_some() {
        obj.insert("$ref".to_string(), Value::String(stripped));
    }
}

/// Draft-4 requires an explicit type for validators to act on shape
/// keywords; infer it from the evidence present.
fn backfill_type(obj: &mut Map<String, Value>) {
    if obj.contains_key("type") {
        return;
    }
    let object_shaped = ["properties", "additionalProperties", "required"]
        .iter()
        .any(|key| obj.contains_key(*key));
    if object_shaped {
        obj.insert("type".to_string(), Value::String("object".to_string()));
    } else if obj.contains_key("items") {
        obj.insert("type".to_string(), Value::String("array".to_string()));
    }
}

// ---------------------------------------------------------------------------
// allOf flattening
// ---------------------------------------------------------------------------

/// Flatten a node's `allOf` into a single merged schema.
///
/// `key` identifies the node in the active set — its document pointer, or
/// the `$ref` string it was resolved through. Ref strings and document
/// pointers share the `#/...` fragment form, so a ref cycle back into a
/// node currently being flattened is caught by string equality.
fn flatten_all_of(
    obj: &mut Map<String, Value>,
    key: &str,
    frozen: &Value,
    active: &mut HashSet<String>,
) {
    if !active.insert(key.to_string()) {
        return;
    }
    flatten_all_of_guarded(obj, key, frozen, active);
    active.remove(key);
}

fn flatten_all_of_guarded(
    obj: &mut Map<String, Value>,
    key: &str,
    frozen: &Value,
    active: &mut HashSet<String>,
) {
    let Some(Value::Array(members)) = obj.get("allOf") else {
        return;
    };
    let members = members.clone();

    // Resolution phase — any failure aborts the flatten, leaving `allOf`
    // in place for a later pass (or forever, which is still valid schema).
    let mut resolved: Vec<Map<String, Value>> = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let Some(member_obj) = member.as_object() else {
            return;
        };
        if let Some(reference) = member_obj.get("$ref").and_then(Value::as_str) {
            let Some((target, target_key)) = resolve_member(reference, frozen) else {
                return;
            };
            let Value::Object(mut target_obj) = target else {
                return;
            };
            flatten_all_of(&mut target_obj, &target_key, frozen, active);
            resolved.push(target_obj);
        } else {
            let mut inline = member_obj.clone();
            let inline_key = join(key, &["allOf", &i.to_string()]);
            flatten_all_of(&mut inline, &inline_key, frozen, active);
            resolved.push(inline);
        }
    }

    // Merge phase: seed from the node's own non-allOf keys, fold members
    // in encounter order.
    let mut merged: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "allOf")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for member in resolved {
        merge_member(&mut merged, member);
    }

    obj.clear();
    obj.extend(merged);
    backfill_type(obj);
}

/// Resolve a `$ref` allOf member, retrying with the dangling `/allOf/<n>`
/// segment stripped. Returns the cloned target plus the pointer used.
fn resolve_member(reference: &str, frozen: &Value) -> Option<(Value, String)> {
    if let Some(target) = resolver::lookup(frozen, reference) {
        return Some((target.clone(), reference.to_string()));
    }
    if dangling_all_of_re().is_match(reference) {
        let stripped = dangling_all_of_re().replace(reference, "").into_owned();
        if let Some(target) = resolver::lookup(frozen, &stripped) {
            return Some((target.clone(), stripped));
        }
    }
    None
}

/// Merge one resolved member into the accumulator.
///
/// `properties`: shallow union, later wins. `required`: set union.
/// Everything else (`type`, `items`, `additionalProperties`,
/// `description`, ...): first-seen wins.
fn merge_member(merged: &mut Map<String, Value>, member: Map<String, Value>) {
    for (key, value) in member {
        match key.as_str() {
            "properties" => match (merged.get_mut("properties"), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    for (name, schema) in incoming {
                        existing.insert(name, schema);
                    }
                }
                (None, incoming) => {
                    merged.insert("properties".to_string(), incoming);
                }
                _ => {}
            },
            "required" => match (merged.get_mut("required"), value) {
                (Some(Value::Array(existing)), Value::Array(incoming)) => {
                    for name in incoming {
                        if !existing.contains(&name) {
                            existing.push(name);
                        }
                    }
                }
                (None, incoming) => {
                    merged.insert("required".to_string(), incoming);
                }
                _ => {}
            },
            _ => {
                if !merged.contains_key(&key) {
                    merged.insert(key, value);
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
