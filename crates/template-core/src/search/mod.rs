//! Search module - nearest-neighbour index, result types and confidence gating
//!
//! This module provides:
//! - An exact vector index over template embeddings
//! - The serialisable result shapes handed across the tool boundary
//! - Semantic threshold gating for confidence routing

pub mod gating;
pub mod vector;

pub use gating::{Confidence, SemanticGate};
pub use vector::{IndexEntry, Metric, VectorIndex};

use serde::{Deserialize, Serialize};

use crate::document::TemplateRecord;

// Search confidence thresholds
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.85;
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.75;

/// A matched template with its score and required placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTemplate {
    pub template: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub description: String,
    /// Cosine-equivalent similarity in `[-1, 1]`; higher is closer
    pub similarity_score: f32,
    pub template_id: usize,
    pub variables: Vec<String>,
}

impl ScoredTemplate {
    pub fn from_record(record: &TemplateRecord, similarity_score: f32) -> Self {
        Self {
            template: record.text.clone(),
            category: record.category.clone(),
            keywords: record.keywords.clone(),
            description: record.description.clone(),
            similarity_score,
            template_id: record.id,
            variables: record.variables(),
        }
    }
}

/// Top match for a query, or the "no match" sentinel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    /// `-1` when nothing matched
    pub template_id: i64,
    pub template: String,
    pub distance: f32,
}

impl BestMatch {
    /// Sentinel returned when the catalog is empty or nothing passes the threshold
    pub fn none() -> Self {
        Self {
            template_id: -1,
            template: String::new(),
            distance: 1.0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.template_id < 0
    }
}

/// Search results wrapped with a confidence verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ScoredTemplate>,
    pub total_matches: usize,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_sentinel() {
        let none = BestMatch::none();
        assert!(none.is_none());
        assert_eq!(none.template_id, -1);
        assert_eq!(none.template, "");
        assert_eq!(none.distance, 1.0);
    }

    #[test]
    fn test_scored_template_from_record() {
        let record = TemplateRecord {
            id: 4,
            text: "Write to {{recipient}} about {{topic}} for {{recipient}}".to_string(),
            category: "request".to_string(),
            keywords: vec!["ask".to_string()],
            description: "General request".to_string(),
        };
        let scored = ScoredTemplate::from_record(&record, 0.5);
        assert_eq!(scored.template_id, 4);
        assert_eq!(scored.variables.len(), 2);
        assert_eq!(scored.similarity_score, 0.5);
    }

    #[test]
    fn test_scored_template_serializes_plain_fields() {
        let record = TemplateRecord {
            id: 0,
            text: "Hi {{name}}".to_string(),
            category: "greeting".to_string(),
            keywords: vec![],
            description: String::new(),
        };
        let json = serde_json::to_value(ScoredTemplate::from_record(&record, 1.0)).unwrap();
        assert_eq!(json["template"], "Hi {{name}}");
        assert_eq!(json["variables"][0], "name");
        assert_eq!(json["template_id"], 0);
    }
}
