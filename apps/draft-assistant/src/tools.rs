//! Tool definitions and handlers

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use template_core::{compose_draft, Composition, ScoredTemplate};

use crate::error::ToolError;
use crate::server::DraftAssistant;

/// A callable tool and the JSON schema of its arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "vector_search_email".to_string(),
            description: Some(
                "Finds the email templates closest in meaning to a free-text request".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What the email should accomplish"
                    },
                    "k": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of templates to return (default: 3)"
                    }
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "best_template".to_string(),
            description: Some(
                "Returns the single best template, or template_id -1 when nothing matches"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What the email should accomplish"
                    }
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "list_template_categories".to_string(),
            description: Some("Lists the distinct template categories".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "get_template_by_category".to_string(),
            description: Some(
                "Returns every template in a category (case-insensitive)".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Category name, e.g. gratitude"
                    }
                },
                "required": ["category"]
            }),
        },
        Tool {
            name: "generate_email_content".to_string(),
            description: Some(
                "Picks the best template and prepares a draft request with its placeholders"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What the email should accomplish"
                    },
                    "variables": {
                        "type": "object",
                        "description": "Known placeholder values; 'subject' overrides the subject line",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Handle a tool call
pub fn handle_tool_call(
    assistant: &DraftAssistant,
    name: &str,
    arguments: Value,
) -> Result<Value, ToolError> {
    tracing::debug!("Tool call: {}", name);
    match name {
        "vector_search_email" => handle_vector_search(assistant, arguments),
        "best_template" => handle_best_template(assistant, arguments),
        "list_template_categories" => handle_list_categories(assistant),
        "get_template_by_category" => handle_template_by_category(assistant, arguments),
        "generate_email_content" => handle_generate_email(assistant, arguments),
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

/// Run a tool call and render either its result or a structured error
pub fn call_tool(assistant: &DraftAssistant, name: &str, arguments: Value) -> Value {
    match handle_tool_call(assistant, name, arguments) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Tool '{}' failed: {}", name, e);
            e.to_json()
        }
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArgument(format!("{} is required", key)))
}

fn handle_vector_search(assistant: &DraftAssistant, args: Value) -> Result<Value, ToolError> {
    let query = required_str(&args, "query")?;
    let k = match args.get("k") {
        None | Some(Value::Null) => assistant.default_k(),
        Some(v) => v
            .as_u64()
            .and_then(|k| usize::try_from(k).ok())
            .ok_or_else(|| {
                ToolError::InvalidArgument("k must be a positive integer".to_string())
            })?,
    };

    let response = assistant.service().search_response(query, k)?;
    Ok(serde_json::to_value(response)?)
}

fn handle_best_template(assistant: &DraftAssistant, args: Value) -> Result<Value, ToolError> {
    let query = required_str(&args, "query")?;
    let best = assistant.service().best_match(query)?;
    Ok(serde_json::to_value(best)?)
}

fn handle_list_categories(assistant: &DraftAssistant) -> Result<Value, ToolError> {
    Ok(json!(assistant.service().list_categories()))
}

fn handle_template_by_category(
    assistant: &DraftAssistant,
    args: Value,
) -> Result<Value, ToolError> {
    let category = required_str(&args, "category")?;

    // Exact category matches carry full similarity
    let templates: Vec<ScoredTemplate> = assistant
        .service()
        .filter_by_category(category)
        .into_iter()
        .map(|record| ScoredTemplate::from_record(record, 1.0))
        .collect();

    Ok(serde_json::to_value(templates)?)
}

fn handle_generate_email(assistant: &DraftAssistant, args: Value) -> Result<Value, ToolError> {
    let query = required_str(&args, "query")?;
    let values: HashMap<String, String> = match args.get("variables") {
        None | Some(Value::Null) => HashMap::new(),
        Some(v) => serde_json::from_value(v.clone()).map_err(|_| {
            ToolError::InvalidArgument("variables must map names to strings".to_string())
        })?,
    };

    match compose_draft(assistant.service(), query, &values)? {
        Composition::Ready(draft) => Ok(serde_json::to_value(draft)?),
        Composition::NoMatch => Err(ToolError::NoMatch(query.to_string())),
    }
}
