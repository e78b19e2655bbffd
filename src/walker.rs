//! Whole-document schema discovery.
//!
//! Finds every schema-bearing location in an OpenAPI document — path items
//! (including `$ref`-resolved ones), webhooks, operation parameters,
//! request bodies, responses, headers, callbacks and the `components`
//! containers — then expands each discovered schema through its structural
//! keywords (`allOf`/`anyOf`/`oneOf`/`not`/`items`/`properties`/
//! object-valued `additionalProperties`).
//!
//! Runs in two phases over the owned tree: collect root pointers first
//! (read-only, with a seen-set so `$ref`d path items are visited once),
//! then mutate each root in place. This is the owned-tree analogue of the
//! identity-keyed visited set: a JSON Pointer names a node uniquely, and
//! structural expansion below a root cannot alias another root.

use std::collections::HashSet;

use serde_json::Value;

use crate::pointer::{self, join};
use crate::resolver;

/// The 8 HTTP verbs a path item may carry.
pub const HTTP_VERBS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Visit every schema node in the document, passing its fragment pointer.
///
/// Each node is visited at most once; sibling order follows collection
/// order, not necessarily document order. The callback may freely mutate
/// the node (and its subtree below keywords the walker has not yet
/// descended into — the walker re-reads children after the callback).
pub fn walk_schemas<F>(doc: &mut Value, visit: &mut F)
where
    F: FnMut(&mut Value, &str),
{
    let roots = collect_schema_roots(doc);
    for root in &roots {
        let Some(ptr) = pointer::as_json_pointer(root) else {
            continue;
        };
        if let Some(node) = doc.pointer_mut(ptr) {
            expand(node, root, visit);
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 1: root collection
// ---------------------------------------------------------------------------

fn collect_schema_roots(doc: &Value) -> Vec<String> {
    let mut roots = Vec::new();
    let mut root_set = HashSet::new();
    let mut seen_items = HashSet::new();

    for container in ["paths", "webhooks"] {
        if let Some(map) = doc.get(container).and_then(Value::as_object) {
            for key in map.keys() {
                collect_path_item(
                    doc,
                    join("#", &[container, key]),
                    &mut seen_items,
                    &mut roots,
                    &mut root_set,
                );
            }
        }
    }

    if let Some(components) = doc.get("components").and_then(Value::as_object) {
        if let Some(schemas) = components.get("schemas").and_then(Value::as_object) {
            for name in schemas.keys() {
                push_root(
                    join("#", &["components", "schemas", name]),
                    &mut roots,
                    &mut root_set,
                );
            }
        }
        if let Some(params) = components.get("parameters").and_then(Value::as_object) {
            for (name, param) in params {
                if param.get("schema").is_some() {
                    push_root(
                        join("#", &["components", "parameters", name, "schema"]),
                        &mut roots,
                        &mut root_set,
                    );
                }
            }
        }
        if let Some(bodies) = components.get("requestBodies").and_then(Value::as_object) {
            for (name, body) in bodies {
                let base = join("#", &["components", "requestBodies", name]);
                collect_content_schemas(body, &base, &mut roots, &mut root_set);
            }
        }
        if let Some(responses) = components.get("responses").and_then(Value::as_object) {
            for (name, response) in responses {
                let base = join("#", &["components", "responses", name]);
                collect_response_schemas(response, &base, &mut roots, &mut root_set);
            }
        }
        if let Some(headers) = components.get("headers").and_then(Value::as_object) {
            for (name, header) in headers {
                if header.get("schema").is_some() {
                    push_root(
                        join("#", &["components", "headers", name, "schema"]),
                        &mut roots,
                        &mut root_set,
                    );
                }
            }
        }
        if let Some(items) = components.get("pathItems").and_then(Value::as_object) {
            for name in items.keys() {
                collect_path_item(
                    doc,
                    join("#", &["components", "pathItems", name]),
                    &mut seen_items,
                    &mut roots,
                    &mut root_set,
                );
            }
        }
        if let Some(callbacks) = components.get("callbacks").and_then(Value::as_object) {
            for (name, callback) in callbacks {
                let base = join("#", &["components", "callbacks", name]);
                collect_callback(doc, callback, &base, &mut seen_items, &mut roots, &mut root_set);
            }
        }
    }

    roots
}

fn push_root(path: String, roots: &mut Vec<String>, root_set: &mut HashSet<String>) {
    if root_set.insert(path.clone()) {
        roots.push(path);
    }
}

/// Collect schema roots under a path item, chasing a `$ref`d item to its
/// canonical pointer. `seen` breaks `$ref` cycles between path items.
fn collect_path_item(
    doc: &Value,
    item_path: String,
    seen: &mut HashSet<String>,
    roots: &mut Vec<String>,
    root_set: &mut HashSet<String>,
) {
    let Some(node) = resolver::lookup(doc, &item_path) else {
        return;
    };
    if !seen.insert(item_path.clone()) {
        return;
    }
    // A referenced path item lives elsewhere — walk it at its own pointer.
    if let Some(reference) = resolver::ref_of(node) {
        if pointer::is_local_ref(reference) {
            collect_path_item(doc, reference.to_string(), seen, roots, root_set);
        }
        return;
    }
    let Some(item) = node.as_object() else {
        return;
    };

    collect_parameter_schemas(item.get("parameters"), &item_path, roots, root_set);

    for verb in HTTP_VERBS {
        let Some(op) = item.get(*verb).and_then(Value::as_object) else {
            continue;
        };
        let op_path = join(&item_path, &[verb]);
        collect_parameter_schemas(op.get("parameters"), &op_path, roots, root_set);

        if let Some(body) = op.get("requestBody") {
            if resolver::ref_of(body).is_none() {
                collect_content_schemas(body, &join(&op_path, &["requestBody"]), roots, root_set);
            }
        }
        if let Some(responses) = op.get("responses").and_then(Value::as_object) {
            for (code, response) in responses {
                if resolver::ref_of(response).is_some() {
                    continue;
                }
                let base = join(&op_path, &["responses", code]);
                collect_response_schemas(response, &base, roots, root_set);
            }
        }
        if let Some(callbacks) = op.get("callbacks").and_then(Value::as_object) {
            for (name, callback) in callbacks {
                let base = join(&op_path, &["callbacks", name]);
                collect_callback(doc, callback, &base, seen, roots, root_set);
            }
        }
    }
}

/// A callback object maps runtime expressions to path items.
fn collect_callback(
    doc: &Value,
    callback: &Value,
    base: &str,
    seen: &mut HashSet<String>,
    roots: &mut Vec<String>,
    root_set: &mut HashSet<String>,
) {
    let Some(map) = callback.as_object() else {
        return;
    };
    for expression in map.keys() {
        collect_path_item(doc, join(base, &[expression]), seen, roots, root_set);
    }
}

fn collect_parameter_schemas(
    parameters: Option<&Value>,
    base: &str,
    roots: &mut Vec<String>,
    root_set: &mut HashSet<String>,
) {
    let Some(list) = parameters.and_then(Value::as_array) else {
        return;
    };
    for (i, param) in list.iter().enumerate() {
        // $ref'd parameters are walked through components.parameters.
        if resolver::ref_of(param).is_none() && param.get("schema").is_some() {
            push_root(
                join(base, &["parameters", &i.to_string(), "schema"]),
                roots,
                root_set,
            );
        }
    }
}

/// Media-type map under `content`: one schema root per media type.
fn collect_content_schemas(
    carrier: &Value,
    base: &str,
    roots: &mut Vec<String>,
    root_set: &mut HashSet<String>,
) {
    let Some(content) = carrier.get("content").and_then(Value::as_object) else {
        return;
    };
    for (media_type, media) in content {
        if media.get("schema").is_some() {
            push_root(
                join(base, &["content", media_type, "schema"]),
                roots,
                root_set,
            );
        }
    }
}

fn collect_response_schemas(
    response: &Value,
    base: &str,
    roots: &mut Vec<String>,
    root_set: &mut HashSet<String>,
) {
    collect_content_schemas(response, base, roots, root_set);
    if let Some(headers) = response.get("headers").and_then(Value::as_object) {
        for (name, header) in headers {
            if resolver::ref_of(header).is_none() && header.get("schema").is_some() {
                push_root(
                    join(base, &["headers", name, "schema"]),
                    roots,
                    root_set,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 2: structural expansion below a schema root
// ---------------------------------------------------------------------------

fn expand<F>(node: &mut Value, path: &str, visit: &mut F)
where
    F: FnMut(&mut Value, &str),
{
    if !node.is_object() {
        return;
    }
    visit(node, path);

    let Some(obj) = node.as_object_mut() else {
        return;
    };

    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(members)) = obj.get_mut(keyword) {
            for (i, member) in members.iter_mut().enumerate() {
                expand(member, &join(path, &[keyword, &i.to_string()]), visit);
            }
        }
    }

    if let Some(not) = obj.get_mut("not") {
        expand(not, &join(path, &["not"]), visit);
    }

    match obj.get_mut("items") {
        Some(Value::Array(tuple)) => {
            for (i, item) in tuple.iter_mut().enumerate() {
                expand(item, &join(path, &["items", &i.to_string()]), visit);
            }
        }
        Some(item @ Value::Object(_)) => {
            expand(item, &join(path, &["items"]), visit);
        }
        _ => {}
    }

    if let Some(Value::Object(properties)) = obj.get_mut("properties") {
        for (name, prop) in properties.iter_mut() {
            let prop_path = join(path, &["properties", name]);
            expand(prop, &prop_path, visit);
        }
    }

    if let Some(additional @ Value::Object(_)) = obj.get_mut("additionalProperties") {
        expand(additional, &join(path, &["additionalProperties"]), visit);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn visited_paths(doc: &mut Value) -> Vec<String> {
        let mut paths = Vec::new();
        walk_schemas(doc, &mut |_, path| paths.push(path.to_string()));
        paths
    }

    #[test]
    fn test_walks_operation_and_component_schemas() {
        let mut doc = json!({
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ],
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "schema": {"type": "array", "items": {"type": "string"}}
                                    }
                                },
                                "headers": {
                                    "X-Total": {"schema": {"type": "integer"}}
                                }
                            }
                        }
                    },
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {"schema": {"type": "object"}}
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}}
                    }
                }
            }
        });

        let paths = visited_paths(&mut doc);
        assert!(paths.contains(&"#/paths/~1pets/get/parameters/0/schema".to_string()));
        assert!(paths
            .contains(&"#/paths/~1pets/get/responses/200/content/application~1json/schema".to_string()));
        assert!(paths
            .contains(&"#/paths/~1pets/get/responses/200/content/application~1json/schema/items".to_string()));
        assert!(paths.contains(&"#/paths/~1pets/get/responses/200/headers/X-Total/schema".to_string()));
        assert!(paths
            .contains(&"#/paths/~1pets/post/requestBody/content/application~1json/schema".to_string()));
        assert!(paths.contains(&"#/components/schemas/Pet".to_string()));
        assert!(paths.contains(&"#/components/schemas/Pet/properties/name".to_string()));
    }

    #[test]
    fn test_ref_path_item_visited_once_at_canonical_pointer() {
        let mut doc = json!({
            "paths": {
                "/a": {"$ref": "#/components/pathItems/Shared"},
                "/b": {"$ref": "#/components/pathItems/Shared"}
            },
            "components": {
                "pathItems": {
                    "Shared": {
                        "get": {
                            "responses": {
                                "200": {
                                    "content": {
                                        "application/json": {"schema": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });

        let paths = visited_paths(&mut doc);
        let shared: Vec<_> = paths
            .iter()
            .filter(|p| p.starts_with("#/components/pathItems/Shared"))
            .collect();
        assert_eq!(shared.len(), 1, "shared path item walked once: {paths:?}");
    }

    #[test]
    fn test_cyclic_path_item_refs_terminate() {
        let mut doc = json!({
            "paths": {
                "/a": {"$ref": "#/paths/~1b"},
                "/b": {"$ref": "#/paths/~1a"}
            }
        });
        // Must not hang; nothing schema-bearing to visit.
        assert!(visited_paths(&mut doc).is_empty());
    }

    #[test]
    fn test_expands_composition_tuple_items_and_additional_properties() {
        let mut doc = json!({
            "components": {
                "schemas": {
                    "Mixed": {
                        "allOf": [{"type": "object"}],
                        "oneOf": [{"type": "string"}],
                        "not": {"type": "null"},
                        "items": [{"type": "integer"}, {"type": "boolean"}],
                        "additionalProperties": {"type": "number"}
                    }
                }
            }
        });

        let paths = visited_paths(&mut doc);
        let base = "#/components/schemas/Mixed";
        for suffix in [
            "",
            "/allOf/0",
            "/oneOf/0",
            "/not",
            "/items/0",
            "/items/1",
            "/additionalProperties",
        ] {
            assert!(
                paths.contains(&format!("{base}{suffix}")),
                "missing {suffix} in {paths:?}"
            );
        }
    }

    #[test]
    fn test_webhooks_and_callbacks() {
        let mut doc = json!({
            "webhooks": {
                "newPet": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {"schema": {"type": "object"}}
                            }
                        },
                        "callbacks": {
                            "onEvent": {
                                "{$request.body#/url}": {
                                    "post": {
                                        "requestBody": {
                                            "content": {
                                                "application/json": {"schema": {"type": "string"}}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });

        let paths = visited_paths(&mut doc);
        assert!(paths
            .iter()
            .any(|p| p.starts_with("#/webhooks/newPet/post/requestBody")));
        assert!(
            paths.iter().any(|p| p.contains("/callbacks/onEvent/")),
            "callback schema not discovered: {paths:?}"
        );
    }
}
