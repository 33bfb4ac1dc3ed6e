//! Error types for template retrieval

use thiserror::Error;

/// Errors raised by the retrieval subsystem
///
/// Every variant is a distinct failure kind; none of them is ever turned into an
/// empty result by this crate. Only `RetrievalService::best_match` maps
/// `EmptyIndex` onto its documented "no match" sentinel.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Embedding computation unavailable or the input text was unusable
    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    /// Index and embedding provider disagree on vector size
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The catalog (and therefore the index) has no entries
    #[error("Template index is empty")]
    EmptyIndex,

    /// The index returned an id the document store does not hold
    #[error("Template not found: {0}")]
    NotFound(usize),

    /// `k` must be at least 1
    #[error("Invalid result limit: {0}")]
    InvalidLimit(usize),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RetrievalError {
    /// Stable machine-readable code for this error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalError::EmbeddingFailure(_) => "embedding_failure",
            RetrievalError::DimensionMismatch { .. } => "dimension_mismatch",
            RetrievalError::EmptyIndex => "empty_index",
            RetrievalError::NotFound(_) => "not_found",
            RetrievalError::InvalidLimit(_) => "invalid_limit",
            RetrievalError::InvalidCatalog(_) => "invalid_catalog",
            RetrievalError::InvalidConfig(_) => "invalid_config",
            RetrievalError::Io(_) => "io",
            RetrievalError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(RetrievalError::EmptyIndex.kind(), "empty_index");
        assert_eq!(RetrievalError::NotFound(3).kind(), "not_found");
        assert_eq!(
            RetrievalError::DimensionMismatch {
                expected: 4,
                actual: 8
            }
            .kind(),
            "dimension_mismatch"
        );
    }

    #[test]
    fn test_display_includes_details() {
        let err = RetrievalError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 384, got 768");
        assert_eq!(RetrievalError::NotFound(7).to_string(), "Template not found: 7");
    }
}
