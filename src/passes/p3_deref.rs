//! Pass 3: Dereferencing
//!
//! Inlines every remaining local `$ref` into a self-contained tree. Each
//! resolved pointer is cached fully-expanded, and an in-flight set detects
//! true reference cycles: a ref back into a pointer currently being
//! expanded higher in the call stack is replaced with an empty object and
//! counted, never recursed into. Non-local or unresolvable refs degrade to
//! a `{description?, type: "object"}` stand-in and are counted as missing.
//! Neither condition fails the run.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::config::ConvertOptions;
use crate::pointer;
use crate::resolver;

/// Counters exposed to the caller after a dereference pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DerefStats {
    /// Refs that were non-local or did not resolve to an object.
    pub missing: usize,
    /// True reference cycles broken with an empty placeholder.
    pub cycles: usize,
}

/// Fully dereference the document in place.
pub fn dereference(doc: &mut Value, options: &ConvertOptions) -> DerefStats {
    let frozen = doc.clone();
    let mut ctx = DerefContext {
        root: &frozen,
        cache: HashMap::new(),
        in_flight: HashSet::new(),
        stats: DerefStats::default(),
    };
    *doc = ctx.expand(&frozen);

    if options.drop_definitions {
        if let Some(root) = doc.as_object_mut() {
            for container in ["definitions", "parameters", "responses"] {
                root.remove(container);
            }
        }
    }

    tracing::debug!(
        missing = ctx.stats.missing,
        cycles = ctx.stats.cycles,
        "dereference pass complete"
    );
    ctx.stats
}

struct DerefContext<'a> {
    root: &'a Value,
    /// Pointer → fully-expanded clone. Entries are cloned out, never
    /// aliased into the result tree.
    cache: HashMap<String, Value>,
    in_flight: HashSet<String>,
    stats: DerefStats,
}

impl DerefContext<'_> {
    fn expand(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(obj) => {
                if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                    let reference = reference.to_string();
                    self.expand_ref(&reference, obj)
                } else {
                    Value::Object(
                        obj.iter()
                            .map(|(key, child)| (key.clone(), self.expand(child)))
                            .collect(),
                    )
                }
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.expand(item)).collect())
            }
            scalar => scalar.clone(),
        }
    }

    fn expand_ref(&mut self, reference: &str, site: &Map<String, Value>) -> Value {
        if !pointer::is_local_ref(reference) {
            self.stats.missing += 1;
            return self.fallback(site);
        }
        if self.in_flight.contains(reference) {
            self.stats.cycles += 1;
            return json!({});
        }

        let resolved = if let Some(cached) = self.cache.get(reference) {
            cached.clone()
        } else {
            let target = resolver::lookup(self.root, reference)
                .filter(|target| target.is_object())
                .cloned();
            let Some(target) = target else {
                self.stats.missing += 1;
                return self.fallback(site);
            };
            self.in_flight.insert(reference.to_string());
            let expanded = self.expand(&target);
            self.in_flight.remove(reference);
            self.cache.insert(reference.to_string(), expanded.clone());
            expanded
        };

        // Sibling keys from the `$ref` site splice on top; siblings win.
        let mut result = resolved;
        if let Value::Object(result_obj) = &mut result {
            for (key, sibling) in site {
                if key == "$ref" {
                    continue;
                }
                let expanded = self.expand(sibling);
                result_obj.insert(key.clone(), expanded);
            }
        }
        result
    }

    fn fallback(&self, site: &Map<String, Value>) -> Value {
        let mut stand_in = Map::new();
        if let Some(description) = site.get("description") {
            stand_in.insert("description".to_string(), description.clone());
        }
        stand_in.insert("type".to_string(), json!("object"));
        Value::Object(stand_in)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
