//! Feature-hashing embedder
//!
//! Maps lower-cased word tokens into a fixed number of buckets with FNV-1a,
//! then L2-normalises the counts. Needs no model files and is fully
//! deterministic, which makes it the default provider and the one tests use.

use super::{l2_normalize, Embedder};
use crate::error::{Result, RetrievalError};

/// Default vector length, matching MiniLM-sized sentence encoders
pub const DEFAULT_HASH_DIM: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "at", "be", "by", "for", "from", "i", "in", "is", "it",
    "me", "my", "of", "on", "or", "our", "that", "the", "this", "to", "we", "with", "you",
    "your",
];

/// Deterministic bag-of-words embedder using the hashing trick
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of `dimension` buckets
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RetrievalError::InvalidConfig(
                "hash embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token.bytes().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        });
        (hash % self.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASH_DIM,
        }
    }
}

/// Split text into normalised word tokens
///
/// Stop-words are dropped unless the text consists of nothing else.
fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| stem(&w.to_lowercase()))
        .collect();

    let content: Vec<String> = words
        .iter()
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .cloned()
        .collect();

    if content.is_empty() {
        words
    } else {
        content
    }
}

/// Fold simple plurals onto their singular form
fn stem(word: &str) -> String {
    if word.chars().count() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(RetrievalError::EmbeddingFailure(
                "input has no embeddable tokens".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            vector[self.bucket(token)] += 1.0;
        }

        if !l2_normalize(&mut vector) {
            return Err(RetrievalError::EmbeddingFailure(
                "embedding has zero norm".to_string(),
            ));
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Thanks to my Colleagues!"),
            vec!["thank".to_string(), "colleague".to_string()]
        );
        assert_eq!(tokenize("to the"), vec!["to".to_string(), "the".to_string()]);
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_stem_keeps_short_and_double_s() {
        assert_eq!(stem("bus"), "bus");
        assert_eq!(stem("process"), "process");
        assert_eq!(stem("dates"), "date");
    }

    #[test]
    fn test_embed_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("request a meeting next week").unwrap();
        let b = embedder.embed("request a meeting next week").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_HASH_DIM);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embed_empty_fails() {
        let embedder = HashEmbedder::default();
        assert!(matches!(
            embedder.embed(""),
            Err(RetrievalError::EmbeddingFailure(_))
        ));
        assert!(matches!(
            embedder.embed("  !? "),
            Err(RetrievalError::EmbeddingFailure(_))
        ));
    }

    #[test]
    fn test_shared_words_increase_similarity() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("thank my colleague").unwrap();
        let related = embedder.embed("write a thank you note to a colleague").unwrap();
        let unrelated = embedder.embed("quarterly invoice payment due").unwrap();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
        assert_eq!(HashEmbedder::new(16).unwrap().dimension(), 16);
    }

    #[test]
    fn test_embed_batch_preserves_order() {
        let embedder = HashEmbedder::new(64).unwrap();
        let batch = embedder.embed_batch(&["alpha", "beta"]).unwrap();
        assert_eq!(batch[0], embedder.embed("alpha").unwrap());
        assert_eq!(batch[1], embedder.embed("beta").unwrap());
    }
}
