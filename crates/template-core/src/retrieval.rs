//! Retrieval service - query embedding, index lookup and result shaping
//!
//! The service owns an explicitly built index, document store and embedder;
//! nothing is global. Once built it is read-only, so a single instance can
//! be shared behind an `Arc` and queried from many threads.
//!
//! # Example
//!
//! ```rust
//! use template_core::{Catalog, HashEmbedder, Metric, RetrievalService};
//!
//! # fn example() -> template_core::Result<()> {
//! let service = RetrievalService::build(
//!     Catalog::builtin()?,
//!     Box::new(HashEmbedder::default()),
//!     Metric::Cosine,
//! )?;
//!
//! for hit in service.search("thank my colleague for the help", 3)? {
//!     println!("{} ({:.3}) needs {:?}", hit.category, hit.similarity_score, hit.variables);
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::collections::BTreeSet;

use crate::document::{Catalog, TemplateRecord};
use crate::embeddings::Embedder;
use crate::error::{Result, RetrievalError};
use crate::search::{
    BestMatch, IndexEntry, Metric, ScoredTemplate, SearchResponse, SemanticGate, VectorIndex,
};
use crate::storage::DocumentStore;

/// Façade over the vector index and document store
pub struct RetrievalService {
    store: DocumentStore,
    /// `None` when the catalog is empty
    index: Option<VectorIndex>,
    embedder: Box<dyn Embedder>,
    match_threshold: Option<f32>,
}

impl RetrievalService {
    /// Wrap an already built index and store
    ///
    /// The index dimensionality must match the embedder's.
    pub fn new(
        store: DocumentStore,
        index: Option<VectorIndex>,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self> {
        if let Some(index) = &index {
            if index.dimension() != embedder.dimension() {
                return Err(RetrievalError::DimensionMismatch {
                    expected: index.dimension(),
                    actual: embedder.dimension(),
                });
            }
        }

        Ok(Self {
            store,
            index,
            embedder,
            match_threshold: None,
        })
    }

    /// Embed every catalog record and build the index
    pub fn build(catalog: Catalog, embedder: Box<dyn Embedder>, metric: Metric) -> Result<Self> {
        let store = DocumentStore::from_catalog(catalog);

        let texts: Vec<String> = store.records().iter().map(|r| r.search_text()).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = embedder.embed_batch(&text_refs)?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dimension()) {
            return Err(RetrievalError::DimensionMismatch {
                expected: embedder.dimension(),
                actual: bad.len(),
            });
        }

        let entries: Vec<IndexEntry> = store
            .records()
            .iter()
            .zip(vectors)
            .map(|(record, vector)| IndexEntry::new(record.id, vector))
            .collect();

        let index = match VectorIndex::build(entries, metric) {
            Ok(index) => Some(index),
            Err(RetrievalError::EmptyIndex) => {
                tracing::warn!("Template catalog is empty; every search will fail");
                None
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            "Retrieval service ready: {} templates, embedder '{}'",
            store.len(),
            embedder.name()
        );

        Self::new(store, index, embedder)
    }

    /// Minimum similarity `best_match` accepts before reporting no match
    pub fn with_match_threshold(mut self, threshold: Option<f32>) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Nearest records and their raw distances, closest first
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<(&TemplateRecord, f32)>> {
        let index = self.index.as_ref().ok_or(RetrievalError::EmptyIndex)?;
        let vector = self.embedder.embed(query)?;
        let hits = index.query(&vector, k)?;

        tracing::debug!("Query '{}' matched {} templates", query, hits.len());

        hits.into_iter()
            .map(|(id, distance)| self.store.get(id).map(|record| (record, distance)))
            .collect()
    }

    /// Top-`k` templates for a free-text query
    ///
    /// Returns every template when `k` exceeds the catalog size.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredTemplate>> {
        let metric = self.metric();
        Ok(self
            .nearest(query, k)?
            .into_iter()
            .map(|(record, distance)| {
                ScoredTemplate::from_record(record, metric.similarity(distance))
            })
            .collect())
    }

    /// `search` wrapped with a confidence verdict
    pub fn search_response(&self, query: &str, k: usize) -> Result<SearchResponse> {
        Ok(SemanticGate::apply(query, self.search(query, k)?))
    }

    /// Single best template, or the `-1` sentinel
    ///
    /// The sentinel is returned for an empty catalog or when the top match is
    /// below the configured threshold. All other failures propagate.
    pub fn best_match(&self, query: &str) -> Result<BestMatch> {
        let hits = match self.nearest(query, 1) {
            Ok(hits) => hits,
            Err(RetrievalError::EmptyIndex) => return Ok(BestMatch::none()),
            Err(e) => return Err(e),
        };

        let Some((record, distance)) = hits.into_iter().next() else {
            return Ok(BestMatch::none());
        };

        if let Some(threshold) = self.match_threshold {
            let similarity = self.metric().similarity(distance);
            if similarity < threshold {
                tracing::warn!(
                    "Best match for '{}' scored {:.3}, below threshold {:.3}",
                    query,
                    similarity,
                    threshold
                );
                return Ok(BestMatch::none());
            }
        }

        Ok(BestMatch {
            template_id: record.id as i64,
            template: record.text.clone(),
            distance,
        })
    }

    /// Distinct categories, sorted
    pub fn list_categories(&self) -> Vec<String> {
        self.store
            .records()
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records whose category matches case-insensitively, in catalog order
    pub fn filter_by_category(&self, category: &str) -> Vec<&TemplateRecord> {
        let wanted = category.to_lowercase();
        self.store
            .records()
            .iter()
            .filter(|r| r.category.to_lowercase() == wanted)
            .collect()
    }

    /// Look up a single record by id
    pub fn template(&self, id: usize) -> Result<&TemplateRecord> {
        self.store.get(id)
    }

    pub fn metric(&self) -> Metric {
        self.index.as_ref().map(VectorIndex::metric).unwrap_or_default()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
