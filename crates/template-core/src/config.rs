//! Configuration management for template retrieval
//!
//! Chooses the catalog source, embedding provider and search metric, and
//! builds a ready `RetrievalService` from them.

use std::path::PathBuf;
use std::str::FromStr;

use crate::document::Catalog;
use crate::embeddings::hash::DEFAULT_HASH_DIM;
use crate::embeddings::{Embedder, HashEmbedder};
use crate::error::{Result, RetrievalError};
use crate::retrieval::RetrievalService;
use crate::search::Metric;

/// Number of results the search tool returns when `k` is not given
pub const DEFAULT_K: usize = 3;

/// Embedding provider options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingProvider {
    /// Feature hashing (no model files)
    #[default]
    Hash,
    /// Local BERT sentence encoder via Candle
    Candle,
}

impl FromStr for EmbeddingProvider {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hash" => Ok(EmbeddingProvider::Hash),
            "candle" | "bert" => Ok(EmbeddingProvider::Candle),
            other => Err(RetrievalError::InvalidConfig(format!(
                "unknown embedding provider: {}",
                other
            ))),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Catalog file; the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    pub provider: EmbeddingProvider,
    /// Model directory for the Candle provider
    pub model_path: Option<PathBuf>,
    /// Vector length for the hash provider
    pub hash_dimension: usize,
    pub metric: Metric,
    pub default_k: usize,
    /// Minimum similarity for `best_match`
    pub match_threshold: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            provider: EmbeddingProvider::Hash,
            model_path: None,
            hash_dimension: DEFAULT_HASH_DIM,
            metric: Metric::Cosine,
            default_k: DEFAULT_K,
            match_threshold: None,
        }
    }
}

impl RetrievalConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - TEMPLATE_CATALOG: path to a JSON catalog (default: built-in)
    /// - EMBEDDING_PROVIDER: "hash" or "candle" (default: "hash")
    /// - EMBEDDING_MODEL_PATH: model directory for "candle"
    /// - EMBEDDING_DIMENSION: hash embedder dimension (default: 384)
    /// - SEARCH_METRIC: "cosine" or "l2" (default: "cosine")
    /// - SEARCH_DEFAULT_K: default result count (default: 3)
    /// - MATCH_THRESHOLD: minimum best-match similarity (default: none)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let provider = lookup("EMBEDDING_PROVIDER")
            .map(|v| v.parse::<EmbeddingProvider>())
            .transpose()?
            .unwrap_or(defaults.provider);

        let metric = lookup("SEARCH_METRIC")
            .map(|v| v.parse::<Metric>())
            .transpose()?
            .unwrap_or(defaults.metric);

        let hash_dimension = parse_number(&lookup, "EMBEDDING_DIMENSION")?
            .unwrap_or(defaults.hash_dimension);

        let default_k = parse_number(&lookup, "SEARCH_DEFAULT_K")?.unwrap_or(defaults.default_k);
        if default_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "SEARCH_DEFAULT_K must be at least 1".to_string(),
            ));
        }

        let match_threshold = parse_number::<f32, _>(&lookup, "MATCH_THRESHOLD")?;

        Ok(Self {
            catalog_path: lookup("TEMPLATE_CATALOG").map(PathBuf::from),
            provider,
            model_path: lookup("EMBEDDING_MODEL_PATH").map(PathBuf::from),
            hash_dimension,
            metric,
            default_k,
            match_threshold,
        })
    }

    /// Load the configured catalog
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Catalog::builtin(),
        }
    }

    /// Instantiate the configured embedding provider
    pub fn build_embedder(&self) -> Result<Box<dyn Embedder>> {
        match self.provider {
            EmbeddingProvider::Hash => Ok(Box::new(HashEmbedder::new(self.hash_dimension)?)),
            EmbeddingProvider::Candle => self.build_candle_embedder(),
        }
    }

    #[cfg(feature = "candle")]
    fn build_candle_embedder(&self) -> Result<Box<dyn Embedder>> {
        use crate::embeddings::bert::{BertEmbedder, DEFAULT_MODEL_REPO};

        let model_path = match &self.model_path {
            Some(path) => path.clone(),
            None => BertEmbedder::download(DEFAULT_MODEL_REPO)
                .map_err(|e| RetrievalError::EmbeddingFailure(e.to_string()))?,
        };
        let embedder = BertEmbedder::load(&model_path)
            .map_err(|e| RetrievalError::EmbeddingFailure(e.to_string()))?;
        Ok(Box::new(embedder))
    }

    #[cfg(not(feature = "candle"))]
    fn build_candle_embedder(&self) -> Result<Box<dyn Embedder>> {
        Err(RetrievalError::InvalidConfig(
            "candle embedding provider not enabled; rebuild with --features candle".to_string(),
        ))
    }

    /// Load the catalog, embed it and build the retrieval service
    pub fn build_service(&self) -> Result<RetrievalService> {
        let catalog = self.load_catalog()?;
        let embedder = self.build_embedder()?;
        tracing::info!(
            "Building index for {} templates with '{}' embeddings ({:?})",
            catalog.len(),
            embedder.name(),
            self.metric
        );

        Ok(RetrievalService::build(catalog, embedder, self.metric)?
            .with_match_threshold(self.match_threshold))
    }
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                RetrievalError::InvalidConfig(format!("{} is not a number: {}", key, raw))
            })
        })
        .transpose()
}
