//! Warning records emitted when a lossy or best-effort rewrite is applied.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single conversion warning tied to a document location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// JSON Pointer of the node the rewrite was applied to
    /// (e.g. "#/components/schemas/Pet/properties/tag").
    pub path: String,
    /// Human-readable description of what was rewritten or dropped.
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Warning sink shared by the conversion passes.
///
/// When collection is disabled the sink discards everything, so passes can
/// call [`push`](Warnings::push) unconditionally.
#[derive(Debug)]
pub struct Warnings {
    enabled: bool,
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, path: &str, message: impl Into<String>) {
        if self.enabled {
            self.items.push(Warning {
                path: path.to_string(),
                message: message.into(),
            });
        }
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }

    #[cfg(test)]
    pub fn items(&self) -> &[Warning] {
        &self.items
    }
}
