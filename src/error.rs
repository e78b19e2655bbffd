//! Error types for document conversion.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The document root is not a JSON object. Nothing can be converted.
    #[error("document root must be an object, got {found}")]
    NonObjectRoot { found: &'static str },

    /// A `$ref` that does not start with `#` reached the primary resolver.
    /// Remote references must be bundled into local ones before conversion.
    #[error("external references unsupported: {reference}")]
    ExternalReference { reference: String },
}
