//! Text embedders
//!
//! `HashingEmbedder` is a deterministic token-hash embedding: lower-cased
//! alphanumeric tokens and adjacent-token bigrams are hashed into a fixed
//! number of buckets with a signed weight, and the result is L2-normalised.
//! It needs no model download and gives identical vectors on every machine,
//! which keeps index rebuilds reproducible.

use regex::Regex;

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Weight of a bigram relative to a single token
const BIGRAM_WEIGHT: f32 = 0.5;

/// Maps text to a fixed-width vector
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;

    fn dimension(&self) -> usize;

    /// Stable identity recorded in the index; a loaded index must match it
    fn embedder_id(&self) -> String;
}

pub struct HashingEmbedder {
    dimension: usize,
    token_re: Regex,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        // Static pattern; cannot fail to compile
        #[allow(clippy::unwrap_used)]
        let token_re = Regex::new(r"[a-z0-9]+").unwrap();
        Self {
            dimension: dimension.max(1),
            token_re,
        }
    }

    fn tokens<'t>(&self, lowered: &'t str) -> Vec<&'t str> {
        self.token_re.find_iter(lowered).map(|m| m.as_str()).collect()
    }

    /// Bucket and sign for a feature string
    fn bucket(&self, feature: &str) -> (usize, f32) {
        let digest = md5::compute(feature.as_bytes());
        let mut head = [0_u8; 8];
        head.copy_from_slice(&digest[..8]);
        let h = u64::from_le_bytes(head);
        #[allow(clippy::cast_possible_truncation)]
        let index = (h % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens = self.tokens(&lowered);
        let mut v = vec![0.0_f32; self.dimension];
        for token in &tokens {
            let (i, sign) = self.bucket(token);
            v[i] += sign;
        }
        for pair in tokens.windows(2) {
            let (i, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
            v[i] += sign * BIGRAM_WEIGHT;
        }
        normalize_in_place(&mut v);
        v
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embedder_id(&self) -> String {
        format!("hashing-md5-v1/{}", self.dimension)
    }
}

fn normalize_in_place(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity; 0.0 when either vector is all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut na = 0.0_f64;
    let mut nb = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}
