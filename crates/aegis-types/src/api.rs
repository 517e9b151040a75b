//! API error envelope

use serde::{Deserialize, Serialize};

/// Coded error returned to the API layer
///
/// The `code` is a stable string the transport maps to a status; `details`
/// carries any extra context (field names, conflicting values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., `INVALID_CREDENTIALS`, `CONCURRENCY_CONFLICT`)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Append a detail line
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}
