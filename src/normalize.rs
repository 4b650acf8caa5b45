//! Normalization of raw process output into structured results.

use serde_json::{Value, json};

/// Outcome of normalizing one invocation's standard output.
///
/// The external tool is asked for JSON via `--json`, but its output is not
/// guaranteed to be JSON in every state. Rather than erroring, non-JSON
/// output is carried verbatim in [`NormalizedResult::RawFallback`] so it is
/// never silently discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    /// Output parsed as a single JSON document.
    Structured(Value),
    /// Output that was present but not parseable; the raw text.
    RawFallback(String),
}

impl NormalizedResult {
    /// Wire representation of the result.
    ///
    /// Raw fallbacks keep the original server's shape:
    /// `{"output": <text>, "raw": true}`.
    pub fn into_value(self) -> Value {
        match self {
            NormalizedResult::Structured(value) => value,
            NormalizedResult::RawFallback(text) => json!({ "output": text, "raw": true }),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, NormalizedResult::RawFallback(_))
    }
}

/// Normalize captured standard output.
///
/// Empty output from a successful process is an implicit success.
pub fn normalize(stdout: &str) -> NormalizedResult {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return NormalizedResult::Structured(json!({ "success": true }));
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => NormalizedResult::Structured(value),
        Err(_) => NormalizedResult::RawFallback(stdout.to_string()),
    }
}
