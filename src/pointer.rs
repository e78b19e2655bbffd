//! RFC 6901 JSON Pointer helpers shared by every pass.
//!
//! Two concerns live here:
//! 1. Escaping/unescaping pointer segments (`~` → `~0`, `/` → `~1`)
//! 2. Building and splitting the `#/...` fragment pointers used by `$ref`
//!    and by warning locations.

use std::borrow::Cow;

/// Escape a single path segment per RFC 6901.
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Unescape a single path segment per RFC 6901.
///
/// Order matters: `~1` before `~0` to avoid double-unescaping.
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a fragment pointer by appending escaped segments to a parent.
///
/// # Example
/// ```
/// use oas_downgrade::pointer::join;
/// assert_eq!(join("#", &["paths", "/pets"]), "#/paths/~1pets");
/// ```
pub fn join(parent: &str, segments: &[&str]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_segment(segment));
    }
    path
}

/// Whether a `$ref` string is a local fragment pointer.
pub fn is_local_ref(reference: &str) -> bool {
    reference.starts_with('#')
}

/// Convert a `#/a/b` fragment into the bare `/a/b` form accepted by
/// [`serde_json::Value::pointer`]. Returns `None` for non-local refs and
/// for fragments that are neither empty nor `/`-rooted.
pub fn as_json_pointer(reference: &str) -> Option<&str> {
    let stripped = reference.strip_prefix('#')?;
    if stripped.is_empty() || stripped.starts_with('/') {
        Some(stripped)
    } else {
        None
    }
}
