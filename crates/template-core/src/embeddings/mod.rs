//! Embedding providers
//!
//! An [`Embedder`] turns text into a fixed-length, unit-normalised vector.
//! Two providers exist:
//! - [`HashEmbedder`]: deterministic feature hashing, no model files needed
//! - `BertEmbedder` (feature `candle`): local sentence-transformer inference

pub mod hash;
#[cfg(feature = "candle")]
pub mod bert;

pub use hash::HashEmbedder;
#[cfg(feature = "candle")]
pub use bert::BertEmbedder;

use crate::error::Result;

/// Converts text into an embedding vector
///
/// Implementations must be deterministic for a fixed configuration and must
/// report failures instead of returning a zero vector.
pub trait Embedder: Send + Sync {
    /// Provider name, for logging
    fn name(&self) -> &str;

    /// Length of every vector this provider produces
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts in order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Scale a vector to unit length in place
///
/// Returns `false` if the vector has zero norm and was left untouched.
pub fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return false;
    }
    for v in vector.iter_mut() {
        *v /= norm;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        assert!(l2_normalize(&mut v));
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero() {
        let mut v = vec![0.0; 4];
        assert!(!l2_normalize(&mut v));
        assert_eq!(v, vec![0.0; 4]);
    }
}
