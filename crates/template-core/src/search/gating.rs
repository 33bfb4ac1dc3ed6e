//! Semantic threshold gating for template matches
//!
//! Classifies the top similarity of a result list:
//! - Direct (>= 0.85): the template fits the request as-is
//! - Similar (0.75-0.85): a usable starting point that needs adapting
//! - Weak (< 0.75): no good fit; the caller should write a custom email

use serde::{Deserialize, Serialize};

use crate::search::{
    ScoredTemplate, SearchResponse, HIGH_CONFIDENCE_THRESHOLD, LOW_CONFIDENCE_THRESHOLD,
};

/// Confidence band of a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Direct,
    Similar,
    Weak,
}

impl From<f32> for Confidence {
    fn from(score: f32) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            Confidence::Direct
        } else if score >= LOW_CONFIDENCE_THRESHOLD {
            Confidence::Similar
        } else {
            Confidence::Weak
        }
    }
}

/// Wraps ranked results with a confidence verdict and hint
pub struct SemanticGate;

impl SemanticGate {
    /// Apply threshold gating to results sorted by descending similarity
    pub fn apply(query: &str, results: Vec<ScoredTemplate>) -> SearchResponse {
        let top = results.first().map(|r| (r.similarity_score, r.category.clone()));

        let (confidence, suggestion) = match top {
            None => (
                Confidence::Weak,
                Some("No templates matched. Consider writing a custom email.".to_string()),
            ),
            Some((score, category)) => match Confidence::from(score) {
                Confidence::Direct => (Confidence::Direct, None),
                Confidence::Similar => (
                    Confidence::Similar,
                    Some(format!(
                        "No exact template for '{}'. The '{}' template is a close starting point.",
                        query, category
                    )),
                ),
                Confidence::Weak => (
                    Confidence::Weak,
                    Some(format!(
                        "No close template for '{}'. Use the listed templates only as loose guidance.",
                        query
                    )),
                ),
            },
        };

        SearchResponse {
            query: query.to_string(),
            total_matches: results.len(),
            results,
            confidence,
            suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: f32) -> ScoredTemplate {
        ScoredTemplate {
            template: "Write a thank-you email to {{recipient}}".to_string(),
            category: "gratitude".to_string(),
            keywords: vec![],
            description: String::new(),
            similarity_score: score,
            template_id: 0,
            variables: vec!["recipient".to_string()],
        }
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(Confidence::from(0.9), Confidence::Direct);
        assert_eq!(Confidence::from(0.85), Confidence::Direct);
        assert_eq!(Confidence::from(0.8), Confidence::Similar);
        assert_eq!(Confidence::from(0.1), Confidence::Weak);
        assert_eq!(Confidence::from(-0.4), Confidence::Weak);
    }

    #[test]
    fn test_direct_match_has_no_suggestion() {
        let response = SemanticGate::apply("thanks", vec![result(0.95)]);
        assert_eq!(response.confidence, Confidence::Direct);
        assert!(response.suggestion.is_none());
        assert_eq!(response.total_matches, 1);
    }

    #[test]
    fn test_similar_match_names_category() {
        let response = SemanticGate::apply("thanks", vec![result(0.8)]);
        assert_eq!(response.confidence, Confidence::Similar);
        assert!(response.suggestion.unwrap().contains("gratitude"));
    }

    #[test]
    fn test_empty_results_are_weak() {
        let response = SemanticGate::apply("anything", vec![]);
        assert_eq!(response.confidence, Confidence::Weak);
        assert_eq!(response.total_matches, 0);
        assert!(response.suggestion.is_some());
    }
}
