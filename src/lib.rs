//! Convert OpenAPI 3.x documents to Swagger 2.0.
//!
//! The conversion pipeline runs four passes over a `serde_json::Value`
//! document, each pass consuming the shape the previous one leaves behind:
//!
//! - Pass 0 (normalize): OpenAPI 3.1 → 3.0. Type arrays collapse to a
//!   single type plus `nullable`, `const` becomes a one-value `enum`,
//!   numeric `exclusiveMinimum`/`exclusiveMaximum` become boolean-flag
//!   form, and 3.1-only keywords are parked under `x-oas31-unsupported`.
//! - Pass 1 (structure): OpenAPI 3.0 → Swagger 2.0. Servers become
//!   host/basePath/schemes, request bodies become `body`/`formData`
//!   parameters with `consumes`, response content becomes per-operation
//!   `produces`, components move to their 2.0 containers, and security
//!   schemes downgrade to their nearest 2.0 equivalents.
//! - Pass 2 (strict): draft-4 sanitization. Unsupported keywords are
//!   stripped, non-cyclic `allOf` compositions flatten into plain object
//!   schemas, dangling `.../allOf/N` refs are repaired, and missing
//!   `type` keys are backfilled.
//! - Pass 3 (deref): every remaining local `$ref` is inlined, with cycle
//!   and missing-target counters instead of failures.
//!
//! Passes 2 and 3 are optional via [`ConvertOptions`].
//!
//! ```
//! use serde_json::json;
//! use oas_downgrade::{convert, ConvertOptions};
//!
//! let document = json!({
//!     "openapi": "3.0.3",
//!     "info": {"title": "demo", "version": "1"},
//!     "paths": {}
//! });
//! let result = convert(document, &ConvertOptions::default()).unwrap();
//! assert_eq!(result.document["swagger"], json!("2.0"));
//! ```

pub mod config;
pub mod error;
pub mod pointer;
pub mod warning;

mod passes;
mod resolver;
mod walker;

use serde_json::Value;

pub use config::ConvertOptions;
pub use error::ConvertError;
pub use warning::Warning;

use warning::Warnings;

/// Output of a successful conversion.
#[derive(Debug)]
pub struct ConvertResult {
    /// The converted Swagger 2.0 document.
    pub document: Value,
    /// Non-fatal fidelity losses recorded along the way.
    pub warnings: Vec<Warning>,
    /// Refs the dereferencer could not resolve (zero when deref is off).
    pub missing_refs: usize,
    /// Reference cycles the dereferencer broke (zero when deref is off).
    pub cycle_refs: usize,
}

/// Convert an OpenAPI 3.x document to Swagger 2.0.
///
/// The document is owned and rewritten in place stage to stage. Errors are
/// reserved for inputs the pipeline cannot work with at all: a non-object
/// root, or an external `$ref` reached while converting.
pub fn convert(document: Value, options: &ConvertOptions) -> Result<ConvertResult, ConvertError> {
    if !document.is_object() {
        return Err(ConvertError::NonObjectRoot {
            found: json_type_name(&document),
        });
    }

    let mut doc = document;
    let mut warnings = Warnings::new(options.collect_warnings);

    tracing::debug!("pass 0: 3.1 -> 3.0 normalization");
    passes::p0_normalize::normalize(&mut doc, &mut warnings);

    tracing::debug!("pass 1: 3.0 -> 2.0 structural conversion");
    passes::p1_structure::convert_structure(&mut doc, &mut warnings)?;

    if options.strict {
        tracing::debug!("pass 2: strict draft-4 sanitization");
        passes::p2_strict::sanitize(&mut doc, options);
    }

    let mut missing_refs = 0;
    let mut cycle_refs = 0;
    if options.deref {
        tracing::debug!("pass 3: dereferencing");
        let stats = passes::p3_deref::dereference(&mut doc, options);
        missing_refs = stats.missing;
        cycle_refs = stats.cycles;
    }

    Ok(ConvertResult {
        document: doc,
        warnings: warnings.into_vec(),
        missing_refs,
        cycle_refs,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ===========================================================================
// Tests
// ===========================================================================
