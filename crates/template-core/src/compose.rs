//! Draft request composition
//!
//! Turns a free-text request into the package handed to the email-writing
//! collaborator: the best template, its required placeholders, which of
//! them are still missing, a subject line and an instruction prompt for the
//! language model. Placeholders are never substituted here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::retrieval::RetrievalService;

/// Marker written into the prompt for variables the caller did not supply
pub const MISSING_VALUE: &str = "[PLEASE PROVIDE]";

const SUBJECT_QUERY_CHARS: usize = 50;

/// Everything needed to write and file one email draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRequest {
    pub template_id: usize,
    pub category: String,
    pub template: String,
    pub subject: String,
    pub prompt: String,
    pub required_variables: Vec<String>,
    pub missing_variables: Vec<String>,
    pub similarity_score: f32,
}

/// Result of composing a draft request
#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    Ready(DraftRequest),
    /// No template matched (empty catalog or below threshold)
    NoMatch,
}

/// Build a draft request for `query` using the best matching template
///
/// `values` holds whatever placeholder values the caller already knows; a
/// `subject` entry overrides the generated subject line.
pub fn compose_draft(
    service: &RetrievalService,
    query: &str,
    values: &HashMap<String, String>,
) -> Result<Composition> {
    let best = service.best_match(query)?;
    if best.is_none() {
        tracing::warn!("No template matched '{}'", query);
        return Ok(Composition::NoMatch);
    }

    let record = service.template(best.template_id as usize)?;
    let required = record.variables();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !values.contains_key(name.as_str()))
        .cloned()
        .collect();

    let subject = values
        .get("subject")
        .cloned()
        .unwrap_or_else(|| default_subject(&record.category, query));

    let variable_lines = required
        .iter()
        .map(|name| {
            let value = values.get(name).map(String::as_str).unwrap_or(MISSING_VALUE);
            format!("- {}: {}", name, value)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"Based on the following email template and user requirements, generate a professional email:

Template Category: {category}
Template Description: {description}
User Query: {query}

Email Template: {template}

Required Variables:
{variables}

Generate a complete email that follows the template structure with natural, specific content:
1. Use a tone appropriate for the email type
2. Include a greeting, body and closing
3. Keep any value marked {missing} as a visible placeholder
4. Make the content specific and actionable"#,
        category = record.category,
        description = record.description,
        query = query,
        template = record.text,
        variables = variable_lines,
        missing = MISSING_VALUE,
    );

    tracing::debug!(
        "Composed draft from template {} with {} missing variables",
        record.id,
        missing.len()
    );

    Ok(Composition::Ready(DraftRequest {
        template_id: record.id,
        category: record.category.clone(),
        template: record.text.clone(),
        subject,
        prompt,
        required_variables: required,
        missing_variables: missing,
        similarity_score: service.metric().similarity(best.distance),
    }))
}

/// "<Category> - <start of query>..."
pub fn default_subject(category: &str, query: &str) -> String {
    let head: String = query.chars().take(SUBJECT_QUERY_CHARS).collect();
    format!("{} - {}...", title_case(category), head)
}

fn title_case(text: &str) -> String {
    text.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
