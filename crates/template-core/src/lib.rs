//! Template Core - Semantic retrieval of email templates
//!
//! This crate provides:
//! - Template catalog loading and placeholder extraction
//! - Embedding providers (feature hashing, Candle BERT behind `candle`)
//! - An exact nearest-neighbour vector index
//! - The retrieval service with confidence gating
//! - Draft request composition for the email writer
//! - Configuration management

pub mod compose;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod retrieval;
pub mod search;
pub mod storage;

// Re-export commonly used types
pub use compose::{compose_draft, Composition, DraftRequest};
pub use config::{EmbeddingProvider, RetrievalConfig};
pub use document::{extract_variables, Catalog, CatalogEntry, TemplateRecord};
pub use embeddings::{Embedder, HashEmbedder};
pub use error::{Result, RetrievalError};
pub use retrieval::RetrievalService;
pub use search::{
    BestMatch, Confidence, IndexEntry, Metric, ScoredTemplate, SearchResponse, VectorIndex,
};
pub use storage::DocumentStore;
