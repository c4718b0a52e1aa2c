//! Sentence embeddings.
//!
//! The selector and keyword extractor consume embeddings through the
//! [`Embedder`] trait; the process holds one implementation, created
//! lazily and treated as immutable. The default implementation is a
//! deterministic hashed character-n-gram encoder, which keeps the
//! pipeline self-contained; a transformer encoder plugs in behind the
//! same trait.

use std::sync::Arc;

/// A fixed-dimension sentence encoder.
pub trait Embedder: Send + Sync {
    /// Embedding dimension D.
    fn dimension(&self) -> usize;

    /// Encodes one text into a D-dimensional vector.
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Encodes a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Shared handle to the process-wide embedder.
pub type SharedEmbedder = Arc<dyn Embedder>;

/// Deterministic hashed character-trigram embedder.
///
/// Tokens are lowercased; each token contributes its word hash and the
/// hashes of its character trigrams, folded into D buckets with a sign
/// bit. Vectors are L2-normalised, so Euclidean distance and cosine
/// similarity rank identically.
pub struct HashedNgramEmbedder {
    dim: usize,
}

impl HashedNgramEmbedder {
    /// Default embedding dimension.
    pub const DEFAULT_DIM: usize = 256;

    /// Creates an embedder with the default dimension.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(Self::DEFAULT_DIM)
    }

    /// Creates an embedder with a custom dimension.
    #[must_use]
    pub fn with_dimension(dim: usize) -> Self {
        Self { dim }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashedNgramEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];

        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if token.is_empty() {
                continue;
            }

            self.accumulate(&mut vector, &token);

            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let gram: String = window.iter().collect();
                self.accumulate(&mut vector, &gram);
            }
        }

        normalize(&mut vector);
        vector
    }
}

/// FNV-1a hash, stable across processes and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Euclidean distance between two vectors.
#[must_use]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity between two vectors.
#[must_use]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// Component-wise mean of a set of vectors.
#[must_use]
pub fn centroid(vectors: &[&Vec<f32>]) -> Vec<f32> {
    if vectors.is_empty() {
        return Vec::new();
    }
    let dim = vectors[0].len();
    let mut mean = vec![0.0f32; dim];
    for vector in vectors {
        for (m, v) in mean.iter_mut().zip(vector.iter()) {
            *m += v;
        }
    }
    let n = vectors.len() as f32;
    for m in &mut mean {
        *m /= n;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let embedder = HashedNgramEmbedder::new();
        let a = embedder.embed("Goldman Sachs beats estimates");
        let b = embedder.embed("Goldman Sachs beats estimates");
        assert_eq!(a, b);
    }

    #[test]
    fn embedding_has_fixed_dimension_and_unit_norm() {
        let embedder = HashedNgramEmbedder::new();
        let v = embedder.embed("earnings release");

        assert_eq!(v.len(), HashedNgramEmbedder::DEFAULT_DIM);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = HashedNgramEmbedder::new();
        let v = embedder.embed("   ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn similar_texts_are_closer_than_dissimilar() {
        let embedder = HashedNgramEmbedder::new();
        let a = embedder.embed("bank reports record quarterly profit");
        let b = embedder.embed("bank posts record quarterly profit");
        let c = embedder.embed("volcano erupts near coastal village");

        assert!(euclidean(&a, &b) < euclidean(&a, &c));
        assert!(cosine(&a, &b) > cosine(&a, &c));
    }

    #[test]
    fn centroid_averages_components() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let mean = centroid(&[&a, &b]);
        assert_eq!(mean, vec![0.5, 0.5]);
    }

    #[test]
    fn batch_matches_single_embeds() {
        let embedder = HashedNgramEmbedder::new();
        let batch = embedder.embed_batch(&["alpha", "beta"]);
        assert_eq!(batch[0], embedder.embed("alpha"));
        assert_eq!(batch[1], embedder.embed("beta"));
    }
}
