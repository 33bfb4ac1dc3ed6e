//! Template records and the catalog they are loaded from

use std::collections::HashSet;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Built-in email template catalog, embedded at compile time
const BUILTIN_CATALOG: &str = include_str!("../catalog/email_templates.json");

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(\w+)\}\}").unwrap();
}

/// Immutable catalog entry with placeholder markers in its text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Dense 0-based position in the catalog
    pub id: usize,
    /// Template text containing `{{name}}` placeholders
    pub text: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub description: String,
}

impl TemplateRecord {
    /// Text that represents this record in the vector index
    pub fn search_text(&self) -> String {
        format!(
            "Template: {}\nCategory: {}\nKeywords: {}\nDescription: {}",
            self.text,
            self.category,
            self.keywords.join(", "),
            self.description
        )
    }

    /// Placeholder names this template requires
    pub fn variables(&self) -> Vec<String> {
        extract_variables(&self.text)
    }
}

/// Extract `{{identifier}}` placeholder names from template text
///
/// Duplicates are removed; names keep the order of their first occurrence.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// One template as it appears in a catalog file
///
/// The aliases accept the older prompt-file layout
/// (`prompts` / `prompt` / `purpose of mail`).
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(alias = "prompt")]
    pub template: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, alias = "purpose of mail")]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(alias = "prompts")]
    templates: Vec<CatalogEntry>,
}

/// Ordered, immutable collection of template records
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<TemplateRecord>,
}

impl Catalog {
    /// Build a catalog, assigning ids in entry order
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let records = entries
            .into_iter()
            .enumerate()
            .map(|(id, entry)| {
                if entry.template.trim().is_empty() {
                    return Err(RetrievalError::InvalidCatalog(format!(
                        "template {} has empty text",
                        id
                    )));
                }
                Ok(TemplateRecord {
                    id,
                    text: entry.template,
                    category: entry.category,
                    keywords: entry.keywords,
                    description: entry.description,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }

    /// Parse a catalog from its JSON representation
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_entries(file.templates)
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            "Loaded {} templates from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The email templates shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn records(&self) -> &[TemplateRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TemplateRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
