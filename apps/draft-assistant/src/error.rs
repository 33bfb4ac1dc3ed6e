//! Error types for tool dispatch

use serde_json::json;
use thiserror::Error;

use template_core::RetrievalError;

/// Errors surfaced across the tool boundary
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No template matched: {0}")]
    NoMatch(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Stable machine-readable code for this error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::NoMatch(_) => "no_match",
            ToolError::Retrieval(e) => e.kind(),
            ToolError::Json(_) => "json",
        }
    }

    /// Structured error payload returned to the caller
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "isError": true,
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_kind_passes_through() {
        let err = ToolError::from(RetrievalError::EmptyIndex);
        assert_eq!(err.kind(), "empty_index");
        assert_eq!(err.to_string(), "Template index is empty");
    }

    #[test]
    fn test_error_payload() {
        let payload = ToolError::UnknownTool("send_email".to_string()).to_json();
        assert_eq!(payload["isError"], true);
        assert_eq!(payload["error"]["kind"], "unknown_tool");
        assert_eq!(payload["error"]["message"], "Unknown tool: send_email");
    }
}
