//! Exact nearest-neighbour index over template embeddings
//!
//! The catalog holds tens of templates, so the index is a linear scan over
//! every entry rather than an approximate structure. Queries are exact and
//! results are fully deterministic.
//!
//! # Example
//!
//! ```rust
//! use template_core::search::{IndexEntry, Metric, VectorIndex};
//!
//! # fn example() -> template_core::Result<()> {
//! let index = VectorIndex::build(
//!     vec![
//!         IndexEntry::new(0, vec![1.0, 0.0]),
//!         IndexEntry::new(1, vec![0.0, 1.0]),
//!     ],
//!     Metric::Cosine,
//! )?;
//!
//! let hits = index.query(&[0.9, 0.1], 1)?;
//! assert_eq!(hits[0].0, 0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Distance function, fixed when the index is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// `1 - cos(a, b)`, in `[0, 2]`
    #[default]
    Cosine,
    /// `Σ (a - b)²`; equals `2 - 2cos` for unit vectors
    SquaredEuclidean,
}

impl Metric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (norm_a * norm_b)
            }
            Metric::SquaredEuclidean => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
        }
    }

    /// Convert a distance into a cosine-equivalent similarity in `[-1, 1]`
    ///
    /// Assumes unit-length embeddings, which every provider emits.
    pub fn similarity(&self, distance: f32) -> f32 {
        let similarity = match self {
            Metric::Cosine => 1.0 - distance,
            Metric::SquaredEuclidean => 1.0 - distance / 2.0,
        };
        similarity.clamp(-1.0, 1.0)
    }
}

impl FromStr for Metric {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "l2" | "euclidean" | "squared_euclidean" => Ok(Metric::SquaredEuclidean),
            other => Err(RetrievalError::InvalidConfig(format!(
                "unknown search metric: {}",
                other
            ))),
        }
    }
}

/// An embedding paired with the id of the template it represents
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub template_id: usize,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(template_id: usize, vector: Vec<f32>) -> Self {
        Self {
            template_id,
            vector,
        }
    }
}

/// Immutable set of index entries answering k-nearest-neighbour queries
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    metric: Metric,
}

impl VectorIndex {
    /// Build the index from all entries at once
    ///
    /// Fails with `EmptyIndex` when `entries` is empty and with
    /// `DimensionMismatch` when entries disagree on vector length.
    pub fn build(entries: Vec<IndexEntry>, metric: Metric) -> Result<Self> {
        let dimension = entries
            .first()
            .map(|e| e.vector.len())
            .ok_or(RetrievalError::EmptyIndex)?;

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                actual: bad.vector.len(),
            });
        }

        tracing::info!(
            "Built {:?} index with {} entries of dimension {}",
            metric,
            entries.len(),
            dimension
        );

        Ok(Self {
            entries,
            dimension,
            metric,
        })
    }

    /// Up to `k` nearest entries as `(template_id, distance)`, closest first
    ///
    /// Equal distances keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 {
            return Err(RetrievalError::InvalidLimit(k));
        }
        if vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(usize, usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                (
                    position,
                    entry.template_id,
                    self.metric.distance(vector, &entry.vector),
                )
            })
            .collect();

        scored.sort_by(|a, b| match a.2.total_cmp(&b.2) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(_, template_id, distance)| (template_id, distance))
            .collect())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a built index; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unit_entries() -> Vec<IndexEntry> {
        vec![
            IndexEntry::new(0, vec![1.0, 0.0, 0.0]),
            IndexEntry::new(1, vec![0.0, 1.0, 0.0]),
            IndexEntry::new(2, vec![0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn test_build_empty() {
        assert!(matches!(
            VectorIndex::build(vec![], Metric::Cosine),
            Err(RetrievalError::EmptyIndex)
        ));
    }

    #[test]
    fn test_build_mixed_dimensions() {
        let entries = vec![
            IndexEntry::new(0, vec![1.0, 0.0]),
            IndexEntry::new(1, vec![1.0, 0.0, 0.0]),
        ];
        assert!(matches!(
            VectorIndex::build(entries, Metric::Cosine),
            Err(RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_query_orders_by_distance() {
        let index = VectorIndex::build(unit_entries(), Metric::Cosine).unwrap();
        let hits = index.query(&[0.1, 0.8, 0.5], 3).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_query_k_larger_than_index() {
        let index = VectorIndex::build(unit_entries(), Metric::SquaredEuclidean).unwrap();
        assert_eq!(index.query(&[1.0, 0.0, 0.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_query_ties_prefer_insertion_order() {
        let index = VectorIndex::build(unit_entries(), Metric::Cosine).unwrap();
        let hits = index.query(&[0.0, 1.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = VectorIndex::build(unit_entries(), Metric::Cosine).unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0], 1),
            Err(RetrievalError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_query_zero_k() {
        let index = VectorIndex::build(unit_entries(), Metric::Cosine).unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 0),
            Err(RetrievalError::InvalidLimit(0))
        ));
    }

    #[test]
    fn test_similarity_conversion_agrees_across_metrics() {
        let a = [0.6, 0.8];
        let b = [0.8, 0.6];
        let cos = Metric::Cosine.similarity(Metric::Cosine.distance(&a, &b));
        let l2 = Metric::SquaredEuclidean.similarity(Metric::SquaredEuclidean.distance(&a, &b));
        assert!((cos - 0.96).abs() < 1e-5);
        assert!((cos - l2).abs() < 1e-5);
    }

    #[test]
    fn test_similarity_is_clamped() {
        assert_eq!(Metric::SquaredEuclidean.similarity(10.0), -1.0);
        assert_eq!(Metric::Cosine.similarity(-0.5), 1.0);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("cosine".parse::<Metric>().unwrap(), Metric::Cosine);
        assert_eq!("L2".parse::<Metric>().unwrap(), Metric::SquaredEuclidean);
        assert!("manhattan".parse::<Metric>().is_err());
    }
}
