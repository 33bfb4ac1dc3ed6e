//! In-memory document store for template records
//!
//! Records are bulk-loaded once and addressed by their dense catalog id.
//! The store is read-only afterwards and safe to share across threads.

use crate::document::{Catalog, TemplateRecord};
use crate::error::{Result, RetrievalError};

/// Owns every `TemplateRecord` for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    records: Vec<TemplateRecord>,
}

impl DocumentStore {
    /// Bulk-load records
    ///
    /// Ids must be dense and 0-based, matching each record's position.
    pub fn load(records: Vec<TemplateRecord>) -> Result<Self> {
        if let Some((position, record)) = records
            .iter()
            .enumerate()
            .find(|(position, record)| record.id != *position)
        {
            return Err(RetrievalError::InvalidCatalog(format!(
                "record at position {} has id {}",
                position, record.id
            )));
        }

        tracing::debug!("Document store loaded with {} records", records.len());
        Ok(Self { records })
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        // Catalog assigns ids by position, so the density check cannot fail.
        Self {
            records: catalog.into_records(),
        }
    }

    /// Look up a record by id
    pub fn get(&self, id: usize) -> Result<&TemplateRecord> {
        self.records.get(id).ok_or_else(|| {
            tracing::error!("Document store has no record for index id {}", id);
            RetrievalError::NotFound(id)
        })
    }

    /// All records in catalog order
    pub fn records(&self) -> &[TemplateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, category: &str) -> TemplateRecord {
        TemplateRecord {
            id,
            text: format!("Template {} for {{{{recipient}}}}", id),
            category: category.to_string(),
            keywords: vec![],
            description: String::new(),
        }
    }

    #[test]
    fn test_get_existing() {
        let store = DocumentStore::load(vec![record(0, "a"), record(1, "b")]).unwrap();
        assert_eq!(store.get(1).unwrap().category, "b");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_missing() {
        let store = DocumentStore::load(vec![record(0, "a")]).unwrap();
        assert!(matches!(store.get(5), Err(RetrievalError::NotFound(5))));
    }

    #[test]
    fn test_load_rejects_sparse_ids() {
        let err = DocumentStore::load(vec![record(0, "a"), record(2, "b")]).unwrap_err();
        assert_eq!(err.kind(), "invalid_catalog");
    }

    #[test]
    fn test_from_catalog() {
        let store = DocumentStore::from_catalog(Catalog::builtin().unwrap());
        assert_eq!(store.len(), 18);
        assert_eq!(store.get(0).unwrap().id, 0);
    }
}
