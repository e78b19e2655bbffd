//! Pass 1: Structural Conversion (3.0 → 2.0)
//!
//! The big rewrite from the OpenAPI 3.0 document shape into Swagger 2.0:
//!
//! 1. first `servers` entry → `host` + `schemes` + `basePath`
//! 2. parameter objects: nested `schema` flattened onto the parameter,
//!    `style`/`explode` → `collectionFormat`
//! 3. `requestBody` → exactly one parameter (formData explode, body, or
//!    binary-upload shape) plus `consumes`
//! 4. responses: `content` → `schema`/`examples`/`produces`, header
//!    schemas flattened
//! 5. shared schema recursion: `oneOf`/`anyOf` dropped, discriminator
//!    mappings resolved and collapsed, `nullable`/`deprecated` moved to
//!    `x-` extensions
//! 6. `components.schemas` → `definitions`, `securitySchemes` →
//!    `securityDefinitions` (with http/oauth2 downgrades), the remainder
//!    → `x-components`, and every `$ref` rewritten to match
//!
//! Reference resolution happens against a frozen pre-pass clone of the
//! document, so in-place rewrites cannot invalidate lookup targets
//! mid-pass. Running the pass on an already-converted document is a no-op.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use url::Url;

use crate::error::ConvertError;
use crate::pointer::{self, join};
use crate::resolver;
use crate::walker::HTTP_VERBS;
use crate::warning::Warnings;

/// Validation keywords copied from a parameter's nested `schema` onto the
/// parameter itself.
const PARAM_SCHEMA_KEYWORDS: &[&str] = &[
    "format",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "multipleOf",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
    "additionalProperties",
    "pattern",
    "enum",
    "default",
    "type",
    "items",
];

/// Which side of an operation a schema belongs to. Response-side
/// conversion drops `writeOnly: true` properties outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Request,
    Response,
}

/// Deferred discriminator-mapping tag: after the pass, the schema at
/// `pointer` gets `x-discriminator-value`/`x-ms-discriminator-value`.
/// Deferred because the mapping target is a different subtree than the
/// one being mutated when the mapping is discovered.
struct TagJob {
    pointer: String,
    value: String,
}

fn bare_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex"))
}

/// Convert the whole document from 3.0 shape to 2.0 shape, in place.
pub fn convert_structure(doc: &mut Value, warnings: &mut Warnings) -> Result<(), ConvertError> {
    let frozen = doc.clone();
    let mut tags = Vec::new();

    convert_servers(doc);
    convert_paths(doc, &frozen, &mut tags, warnings)?;
    convert_component_path_items(doc, &frozen, &mut tags, warnings)?;
    convert_definitions(doc, &frozen, &mut tags, warnings);
    apply_tags(doc, tags);
    restructure_components(doc);
    rewrite_refs(doc);
    Ok(())
}

// ---------------------------------------------------------------------------
// Servers → host / schemes / basePath
// ---------------------------------------------------------------------------

fn convert_servers(doc: &mut Value) {
    let Some(root) = doc.as_object_mut() else {
        return;
    };

    let first_server = root
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
        .and_then(Value::as_object)
        .cloned();
    if let Some(server) = first_server {
        if let Some(url) = server.get("url").and_then(Value::as_str) {
            let substituted = substitute_server_variables(url, server.get("variables"));
            match parse_absolute_http(&substituted) {
                Some((host, scheme, path)) => {
                    if !host.is_empty() {
                        root.insert("host".to_string(), json!(host));
                    }
                    root.insert("schemes".to_string(), json!([scheme]));
                    if !path.is_empty() {
                        root.insert("basePath".to_string(), json!(path));
                    }
                }
                None => {
                    // Relative or unparseable — keep the literal string.
                    root.insert("basePath".to_string(), json!(substituted));
                }
            }
        }
    }

    root.remove("servers");
    root.remove("openapi");
    root.insert("swagger".to_string(), json!("2.0"));

    // Webhooks and callbacks have no 2.0 counterpart; parked as extensions.
    if let Some(webhooks) = root.remove("webhooks") {
        root.insert("x-webhooks".to_string(), webhooks);
    }
}

/// Replace every `{var}` template with the variable's declared default.
fn substitute_server_variables(url: &str, variables: Option<&Value>) -> String {
    let mut out = url.to_string();
    let Some(variables) = variables.and_then(Value::as_object) else {
        return out;
    };
    for (name, var) in variables {
        let Some(default) = var.get("default") else {
            continue;
        };
        let default = match default {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out = out.replace(&format!("{{{name}}}"), &default);
    }
    out
}

/// Decompose an absolute `http(s)://` URL into (host[:port], scheme, path).
fn parse_absolute_http(url: &str) -> Option<(String, String, String)> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    let mut host = parsed.host_str().unwrap_or_default().to_string();
    if let Some(port) = parsed.port() {
        host = format!("{host}:{port}");
    }
    let path = parsed.path().to_string();
    Some((host, parsed.scheme().to_string(), path))
}

// ---------------------------------------------------------------------------
// Paths / operations
// ---------------------------------------------------------------------------

fn convert_paths(
    doc: &mut Value,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) -> Result<(), ConvertError> {
    let Some(Value::Object(paths)) = doc.get_mut("paths") else {
        return Ok(());
    };
    for (path_key, item) in paths.iter_mut() {
        let item_path = join("#", &["paths", path_key]);
        convert_path_item(item, &item_path, frozen, tags, warnings)?;
    }
    Ok(())
}

fn convert_path_item(
    item: &mut Value,
    item_path: &str,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) -> Result<(), ConvertError> {
    // A $ref'd path item would reach the output unconverted (its target
    // lands in x-components as raw 3.0); resolve and convert a clone here,
    // like parameters and responses.
    if resolver::ref_of(item).is_some() {
        let Some(resolved) = resolver::resolve_cloned(frozen, item)? else {
            // Dangling local ref — leave the site untouched.
            return Ok(());
        };
        *item = resolved;
    }
    let Some(item_obj) = item.as_object_mut() else {
        return Ok(());
    };

    // Path-item servers have no 2.0 counterpart; parked as an extension.
    if let Some(servers) = item_obj.remove("servers") {
        item_obj.insert("x-servers".to_string(), servers);
    }

    if let Some(parameters) = item_obj.get_mut("parameters") {
        convert_parameter_list(parameters, frozen, warnings)?;
    }

    for verb in HTTP_VERBS {
        let Some(op) = item_obj.get_mut(*verb).and_then(Value::as_object_mut) else {
            continue;
        };
        let op_path = join(item_path, &[verb]);

        if let Some(servers) = op.remove("servers") {
            op.insert("x-servers".to_string(), servers);
        }
        if let Some(parameters) = op.get_mut("parameters") {
            convert_parameter_list(parameters, frozen, warnings)?;
        }
        convert_request_body(op, frozen, tags, warnings)?;
        convert_responses(op, &op_path, frozen, tags, warnings)?;

        if let Some(callbacks) = op.remove("callbacks") {
            op.insert("x-callbacks".to_string(), callbacks);
        }
    }
    Ok(())
}

/// `components.pathItems` end up under `x-components` and must not carry
/// raw 3.0 operation shapes there; convert them like `paths` entries.
fn convert_component_path_items(
    doc: &mut Value,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) -> Result<(), ConvertError> {
    let Some(Value::Object(items)) = doc.pointer_mut("/components/pathItems") else {
        return Ok(());
    };
    for (name, item) in items.iter_mut() {
        let item_path = join("#", &["components", "pathItems", name]);
        convert_path_item(item, &item_path, frozen, tags, warnings)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

fn convert_parameter_list(
    parameters: &mut Value,
    frozen: &Value,
    warnings: &mut Warnings,
) -> Result<(), ConvertError> {
    let Some(list) = parameters.as_array_mut() else {
        return Ok(());
    };
    for slot in list.iter_mut() {
        *slot = convert_parameter(frozen, slot, warnings)?;
    }
    Ok(())
}

/// Convert a single parameter (resolving and cloning a `$ref`d one).
fn convert_parameter(
    frozen: &Value,
    param: &Value,
    _warnings: &mut Warnings,
) -> Result<Value, ConvertError> {
    let Some(mut resolved) = resolver::resolve_cloned(frozen, param)? else {
        // Dangling local ref — leave the site untouched.
        return Ok(param.clone());
    };
    let Some(obj) = resolved.as_object_mut() else {
        return Ok(resolved);
    };

    if obj.get("in").and_then(Value::as_str) == Some("body") {
        return Ok(resolved);
    }

    if let Some(schema) = obj.remove("schema") {
        if let Some(schema_obj) = schema.as_object() {
            flatten_parameter_schema(obj, schema_obj);
        }
    }
    obj.remove("allowReserved");
    if let Some(example) = obj.remove("example") {
        obj.insert("x-example".to_string(), example);
    }

    if obj.get("type").and_then(Value::as_str) == Some("array")
        && !obj.contains_key("collectionFormat")
    {
        let style = obj.get("style").and_then(Value::as_str);
        let explode = obj.get("explode").and_then(Value::as_bool);
        if let Some(format) = collection_format(style, explode) {
            obj.insert("collectionFormat".to_string(), json!(format));
        }
    }
    obj.remove("style");
    obj.remove("explode");

    Ok(resolved)
}

/// Copy the fixed validation-keyword set (plus vendor extensions and a
/// missing `description`) from the nested schema onto the parameter.
fn flatten_parameter_schema(param: &mut Map<String, Value>, schema: &Map<String, Value>) {
    for keyword in PARAM_SCHEMA_KEYWORDS {
        let Some(value) = schema.get(*keyword) else {
            continue;
        };
        if *keyword == "additionalProperties" && value.is_boolean() {
            continue;
        }
        param.insert((*keyword).to_string(), value.clone());
    }
    for (key, value) in schema {
        if key.starts_with("x-") && !param.contains_key(key) {
            param.insert(key.clone(), value.clone());
        }
    }
    if !param.contains_key("description") {
        if let Some(description) = schema.get("description") {
            param.insert("description".to_string(), description.clone());
        }
    }
}

/// Map a 3.0 `style`/`explode` pair to a 2.0 `collectionFormat`.
///
/// Unrecognized styles (including the `deepOpbject` typo token some
/// generators emit) and the query/cookie default fall through to the
/// `form` row: `multi`, or `csv` when `explode` is explicitly false.
fn collection_format(style: Option<&str>, explode: Option<bool>) -> Option<&'static str> {
    match style {
        Some("matrix") => {
            if explode == Some(true) {
                None
            } else {
                Some("csv")
            }
        }
        Some("label") => None,
        Some("simple") => Some("csv"),
        Some("spaceDelimited") => Some("ssv"),
        Some("pipeDelimited") => Some("pipes"),
        _ => {
            if explode == Some(false) {
                Some("csv")
            } else {
                Some("multi")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request body → one parameter
// ---------------------------------------------------------------------------

fn is_form_media(media_type: &str) -> bool {
    let essence = media_essence(media_type);
    essence == "application/x-www-form-urlencoded" || essence.starts_with("multipart/")
}

fn is_json_media(media_type: &str) -> bool {
    let essence = media_essence(media_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn media_essence(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or(media_type).trim()
}

fn is_wildcard_subtype(media_type: &str) -> bool {
    media_essence(media_type)
        .split('/')
        .nth(1)
        .is_some_and(|subtype| subtype == "*")
}

fn concrete_media_types(content: &Map<String, Value>) -> Vec<Value> {
    content
        .keys()
        .filter(|mt| !mt.contains('*'))
        .map(|mt| json!(mt))
        .collect()
}

fn convert_request_body(
    op: &mut Map<String, Value>,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) -> Result<(), ConvertError> {
    let Some(raw) = op.remove("requestBody") else {
        return Ok(());
    };
    let Some(body) = resolver::resolve_cloned(frozen, &raw)? else {
        return Ok(());
    };
    let Some(body_obj) = body.as_object() else {
        return Ok(());
    };
    let Some(content) = body_obj.get("content").and_then(Value::as_object) else {
        return Ok(());
    };

    let form_mt = content.keys().find(|mt| is_form_media(mt)).cloned();
    let json_mt = content.keys().find(|mt| is_json_media(mt)).cloned();

    if let Some(mt) = form_mt {
        op.insert("consumes".to_string(), Value::Array(concrete_media_types(content)));
        let mut schema = media_schema(content, &mt).unwrap_or_else(|| json!({}));
        inline_foreign_ref(&mut schema, frozen)?;
        convert_schema(&mut schema, Direction::Request, frozen, tags, warnings);
        explode_form_parameters(op, schema, body_obj);
    } else if let Some(mt) = json_mt {
        op.insert("consumes".to_string(), Value::Array(concrete_media_types(content)));
        let mut schema = media_schema(content, &mt).unwrap_or_else(|| json!({}));
        inline_foreign_ref(&mut schema, frozen)?;
        convert_schema(&mut schema, Direction::Request, frozen, tags, warnings);
        push_body_parameter(op, "body", schema, body_obj);
    } else if let Some(first_mt) = content.keys().next().cloned() {
        // Arbitrary binary upload.
        let concrete = concrete_media_types(content);
        let consumes = if concrete.is_empty() {
            vec![json!("application/octet-stream")]
        } else {
            concrete
        };
        op.insert("consumes".to_string(), Value::Array(consumes));
        let mut schema = media_schema(content, &first_mt)
            .unwrap_or_else(|| json!({"type": "string", "format": "binary"}));
        inline_foreign_ref(&mut schema, frozen)?;
        convert_schema(&mut schema, Direction::Request, frozen, tags, warnings);
        push_body_parameter(op, "file", schema, body_obj);
    }

    Ok(())
}

fn media_schema(content: &Map<String, Value>, media_type: &str) -> Option<Value> {
    content.get(media_type)?.get("schema").cloned()
}

/// Form-encoded bodies: an object schema with `properties` explodes into
/// one `formData` parameter per non-readOnly property; anything else
/// stays a single parameter carrying the whole schema.
fn explode_form_parameters(op: &mut Map<String, Value>, schema: Value, body: &Map<String, Value>) {
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .cloned();

    let Some(properties) = properties else {
        let mut param = match schema {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        param.insert("name".to_string(), json!("body"));
        param.insert("in".to_string(), json!("formData"));
        if let Some(required) = body.get("required") {
            param.insert("required".to_string(), required.clone());
        }
        append_parameter(op, Value::Object(param));
        return;
    };

    let required_names: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    for (name, prop) in properties {
        if prop.get("readOnly").and_then(Value::as_bool) == Some(true) {
            continue;
        }
        let mut param = match prop {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("schema".to_string(), other);
                map
            }
        };
        if required_names.contains(&name.as_str()) {
            param.insert("required".to_string(), json!(true));
        }
        param.insert("name".to_string(), json!(name));
        param.insert("in".to_string(), json!("formData"));
        append_parameter(op, Value::Object(param));
    }
}

fn push_body_parameter(
    op: &mut Map<String, Value>,
    name: &str,
    schema: Value,
    body: &Map<String, Value>,
) {
    let mut param = Map::new();
    param.insert("name".to_string(), json!(name));
    param.insert("in".to_string(), json!("body"));
    if let Some(description) = body.get("description") {
        param.insert("description".to_string(), description.clone());
    }
    if let Some(required) = body.get("required") {
        param.insert("required".to_string(), required.clone());
    }
    param.insert("schema".to_string(), schema);
    append_parameter(op, Value::Object(param));
}

fn append_parameter(op: &mut Map<String, Value>, param: Value) {
    match op.get_mut("parameters") {
        Some(Value::Array(list)) => list.push(param),
        _ => {
            op.insert("parameters".to_string(), Value::Array(vec![param]));
        }
    }
}

/// Inline a schema-position `$ref` whose target will not survive the
/// container rewrite (anything outside `#/components/schemas/`).
fn inline_foreign_ref(schema: &mut Value, frozen: &Value) -> Result<(), ConvertError> {
    let Some(reference) = resolver::ref_of(schema) else {
        return Ok(());
    };
    if reference.starts_with("#/components/schemas/") {
        return Ok(());
    }
    if !pointer::is_local_ref(reference) {
        return Err(ConvertError::ExternalReference {
            reference: reference.to_string(),
        });
    }
    if let Some(target) = resolver::lookup(frozen, reference) {
        *schema = target.clone();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

fn convert_responses(
    op: &mut Map<String, Value>,
    op_path: &str,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) -> Result<(), ConvertError> {
    let mut produces: Vec<String> = Vec::new();

    if let Some(Value::Object(responses)) = op.get_mut("responses") {
        for (code, slot) in responses.iter_mut() {
            let Some(mut response) = resolver::resolve_cloned(frozen, slot)? else {
                continue;
            };
            if let Some(response_obj) = response.as_object_mut() {
                let response_path = join(op_path, &["responses", code]);
                convert_response(
                    response_obj,
                    &response_path,
                    frozen,
                    tags,
                    warnings,
                    &mut produces,
                )?;
            }
            *slot = response;
        }
    }

    if !produces.is_empty() {
        op.insert(
            "produces".to_string(),
            Value::Array(produces.into_iter().map(|mt| json!(mt)).collect()),
        );
    }
    Ok(())
}

fn convert_response(
    response: &mut Map<String, Value>,
    _response_path: &str,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
    produces: &mut Vec<String>,
) -> Result<(), ConvertError> {
    if let Some(Value::Object(content)) = response.remove("content") {
        let mut examples = Map::new();
        for (media_type, media) in &content {
            let produced = if is_wildcard_subtype(media_type) {
                "application/octet-stream".to_string()
            } else {
                media_type.clone()
            };
            if !produces.contains(&produced) {
                produces.push(produced);
            }
            if let Some(example) = media.get("example") {
                examples.insert(media_type.clone(), example.clone());
            }
        }
        if !examples.is_empty() {
            response.insert("examples".to_string(), Value::Object(examples));
        }

        let candidate = content
            .keys()
            .find(|mt| is_json_media(mt))
            .or_else(|| content.keys().next())
            .cloned();
        if let Some(media_type) = candidate {
            if let Some(schema) = media_schema(&content, &media_type) {
                let mut schema = schema;
                inline_foreign_ref(&mut schema, frozen)?;
                convert_schema(&mut schema, Direction::Response, frozen, tags, warnings);
                response.insert("schema".to_string(), schema);
            }
        }
    }

    if let Some(Value::Object(headers)) = response.get_mut("headers") {
        for (_name, slot) in headers.iter_mut() {
            let Some(mut header) = resolver::resolve_cloned(frozen, slot)? else {
                continue;
            };
            if let Some(header_obj) = header.as_object_mut() {
                if let Some(schema) = header_obj.remove("schema") {
                    if let Some(ty) = schema.get("type") {
                        header_obj.insert("type".to_string(), ty.clone());
                    }
                    if let Some(format) = schema.get("format") {
                        header_obj.insert("format".to_string(), format.clone());
                    }
                }
            }
            *slot = header;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Shared schema recursion
// ---------------------------------------------------------------------------

/// 3.0 → 2.0 schema rewrite, shared by parameters, bodies, responses and
/// top-level definitions. Pure tree recursion — `$ref` nodes pass through
/// untouched (the sanitizer and dereferencer handle them later).
fn convert_schema(
    schema: &mut Value,
    direction: Direction,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) {
    let Some(obj) = schema.as_object_mut() else {
        return;
    };

    // Swagger 2.0 has no oneOf/anyOf; the drop is lossy, and a
    // discriminator without its variants is meaningless.
    if obj.contains_key("oneOf") || obj.contains_key("anyOf") {
        obj.remove("oneOf");
        obj.remove("anyOf");
        obj.remove("discriminator");
    }

    if let Some(Value::Array(members)) = obj.get_mut("allOf") {
        for member in members.iter_mut() {
            convert_schema(member, direction, frozen, tags, warnings);
        }
    }

    if let Some(discriminator) = obj.get("discriminator").filter(|d| d.is_object()).cloned() {
        resolve_discriminator_mapping(&discriminator, frozen, tags);
        match discriminator.get("propertyName").and_then(Value::as_str) {
            Some(property) => {
                obj.insert("discriminator".to_string(), json!(property));
            }
            None => {
                obj.remove("discriminator");
            }
        }
    }

    if let Some(Value::Object(properties)) = obj.get_mut("properties") {
        let names: Vec<String> = properties.keys().cloned().collect();
        for name in names {
            let write_only = properties
                .get(&name)
                .and_then(|p| p.get("writeOnly"))
                .and_then(Value::as_bool)
                == Some(true);
            if write_only && direction == Direction::Response {
                properties.remove(&name);
                continue;
            }
            if let Some(property) = properties.get_mut(&name) {
                convert_schema(property, direction, frozen, tags, warnings);
                if let Some(property_obj) = property.as_object_mut() {
                    property_obj.remove("writeOnly");
                }
            }
        }
    }

    match obj.get_mut("items") {
        Some(items @ Value::Object(_)) => {
            convert_schema(items, direction, frozen, tags, warnings);
        }
        Some(Value::Array(tuple)) => {
            for item in tuple.iter_mut() {
                convert_schema(item, direction, frozen, tags, warnings);
            }
        }
        _ => {}
    }

    if obj.get("nullable") == Some(&Value::Bool(true)) {
        obj.remove("nullable");
        obj.insert("x-nullable".to_string(), Value::Bool(true));
    }
    if let Some(deprecated) = obj.remove("deprecated") {
        if !obj.contains_key("x-deprecated") {
            obj.insert("x-deprecated".to_string(), deprecated);
        }
    }
}

/// Resolve each `discriminator.mapping` entry to a schema pointer — first
/// as a bare component name, else as a literal local ref — and queue the
/// tag. Unresolved entries are logged and skipped.
fn resolve_discriminator_mapping(discriminator: &Value, frozen: &Value, tags: &mut Vec<TagJob>) {
    let Some(mapping) = discriminator.get("mapping").and_then(Value::as_object) else {
        return;
    };
    for (key, target) in mapping {
        let Some(target) = target.as_str() else {
            tracing::warn!(mapping_key = %key, "discriminator mapping value is not a string");
            continue;
        };
        let pointer = if bare_name_re().is_match(target) {
            format!("#/components/schemas/{target}")
        } else {
            target.to_string()
        };
        if resolver::lookup(frozen, &pointer).is_some() {
            tags.push(TagJob {
                pointer,
                value: key.clone(),
            });
        } else {
            tracing::warn!(
                mapping_key = %key,
                target = %target,
                "discriminator mapping target did not resolve; skipped"
            );
        }
    }
}

fn apply_tags(doc: &mut Value, tags: Vec<TagJob>) {
    for tag in tags {
        let Some(ptr) = pointer::as_json_pointer(&tag.pointer) else {
            continue;
        };
        if let Some(Value::Object(target)) = doc.pointer_mut(ptr) {
            target.insert("x-discriminator-value".to_string(), json!(tag.value));
            target.insert("x-ms-discriminator-value".to_string(), json!(tag.value));
        }
    }
}

// ---------------------------------------------------------------------------
// Components → definitions / securityDefinitions / x-components
// ---------------------------------------------------------------------------

fn convert_definitions(
    doc: &mut Value,
    frozen: &Value,
    tags: &mut Vec<TagJob>,
    warnings: &mut Warnings,
) {
    let Some(Value::Object(schemas)) = doc.pointer_mut("/components/schemas") else {
        return;
    };
    for (_name, schema) in schemas.iter_mut() {
        convert_schema(schema, Direction::Request, frozen, tags, warnings);
    }
}

fn restructure_components(doc: &mut Value) {
    let Some(root) = doc.as_object_mut() else {
        return;
    };
    let Some(Value::Object(mut components)) = root.remove("components") else {
        return;
    };

    if let Some(schemas) = components.remove("schemas") {
        root.insert("definitions".to_string(), schemas);
    }
    if let Some(Value::Object(schemes)) = components.remove("securitySchemes") {
        let mut definitions = Map::new();
        for (name, scheme) in schemes {
            definitions.insert(name, downgrade_security_scheme(scheme));
        }
        root.insert("securityDefinitions".to_string(), Value::Object(definitions));
    }
    if !components.is_empty() {
        root.insert("x-components".to_string(), Value::Object(components));
    }
}

/// Downgrade a 3.0 security scheme to its closest 2.0 equivalent.
///
/// `http`+`basic` → `basic`; `http`+`bearer` → an `Authorization` header
/// apiKey; `oauth2` → the first declared flow with its URLs and scopes.
/// Anything else (apiKey, openIdConnect) passes through unchanged.
fn downgrade_security_scheme(scheme: Value) -> Value {
    let mut obj = match scheme {
        Value::Object(map) => map,
        other => return other,
    };

    match obj.get("type").and_then(Value::as_str) {
        Some("http") => {
            let http_scheme = obj
                .get("scheme")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_ascii_lowercase();
            match http_scheme.as_str() {
                "basic" => {
                    obj.insert("type".to_string(), json!("basic"));
                    obj.remove("scheme");
                }
                "bearer" => {
                    obj.insert("type".to_string(), json!("apiKey"));
                    obj.insert("name".to_string(), json!("Authorization"));
                    obj.insert("in".to_string(), json!("header"));
                    obj.remove("scheme");
                    obj.remove("bearerFormat");
                }
                _ => {}
            }
        }
        Some("oauth2") => {
            if let Some(Value::Object(flows)) = obj.remove("flows") {
                if let Some((flow_name, flow)) = flows.into_iter().next() {
                    let mapped = match flow_name.as_str() {
                        "clientCredentials" => "application".to_string(),
                        "authorizationCode" => "accessCode".to_string(),
                        other => other.to_string(),
                    };
                    obj.insert("flow".to_string(), json!(mapped));
                    for key in ["authorizationUrl", "tokenUrl", "scopes"] {
                        if let Some(value) = flow.get(key) {
                            obj.insert(key.to_string(), value.clone());
                        }
                    }
                }
            }
        }
        _ => {}
    }

    Value::Object(obj)
}

// ---------------------------------------------------------------------------
// $ref rewriting
// ---------------------------------------------------------------------------

/// Rewrite every `$ref` in the document for the renamed containers.
fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                if let Some(rest) = reference.strip_prefix("#/components/schemas/") {
                    *reference = format!("#/definitions/{rest}");
                } else if let Some(rest) = reference.strip_prefix("#/components/") {
                    *reference = format!("#/x-components/{rest}");
                }
            }
            for (_key, child) in map.iter_mut() {
                rewrite_refs(child);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                rewrite_refs(item);
            }
        }
        _ => {}
    }
}

// ===========================================================================
// Tests
// ===========================================================================
