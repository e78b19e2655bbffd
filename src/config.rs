//! Configuration for document conversion.

use serde::{Deserialize, Serialize};

/// Options for converting an OpenAPI 3.x document to Swagger 2.0.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `strip-extensions`,
/// `drop-definitions`). This naming convention is part of the public API
/// contract for callers loading options from config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertOptions {
    /// Run the strict draft-4 sanitizer (keyword stripping, `allOf`
    /// flattening, dangling-ref repair). Default: true.
    pub strict: bool,
    /// Fully dereference remaining local `$ref`s into a self-contained
    /// tree. Default: true.
    pub deref: bool,
    /// Sanitizer drops `x-` vendor-extension keys from schemas.
    /// Default: false.
    pub strip_extensions: bool,
    /// Dereferencer removes the now-redundant `definitions`, `parameters`
    /// and `responses` containers after inlining. Default: false.
    pub drop_definitions: bool,
    /// Collect human-readable warnings for every normalization rewrite
    /// instead of mutating silently. Default: true.
    pub collect_warnings: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            strict: true,
            deref: true,
            strip_extensions: false,
            drop_definitions: false,
            collect_warnings: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_serde_round_trip() {
        let opts = ConvertOptions {
            strict: false,
            deref: true,
            strip_extensions: true,
            drop_definitions: true,
            collect_warnings: false,
        };

        let json = serde_json::to_string(&opts).unwrap();

        // Verify kebab-case field names are in the JSON
        assert!(json.contains("\"strip-extensions\""));
        assert!(json.contains("\"drop-definitions\""));
        assert!(json.contains("\"collect-warnings\""));

        let deserialized: ConvertOptions = serde_json::from_str(&json).unwrap();
        assert!(!deserialized.strict);
        assert!(deserialized.deref);
        assert!(deserialized.strip_extensions);
        assert!(deserialized.drop_definitions);
        assert!(!deserialized.collect_warnings);
    }

    #[test]
    fn test_defaults() {
        let opts = ConvertOptions::default();
        assert!(opts.strict);
        assert!(opts.deref);
        assert!(!opts.strip_extensions);
        assert!(!opts.drop_definitions);
        assert!(opts.collect_warnings);
    }
}
