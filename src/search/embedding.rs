//! Text embedding
//!
//! The default model is Harmonic Token Projection (HTP): a deterministic,
//! training-free projection of Unicode tokens onto the unit circle for a set of
//! coprime moduli. It needs no model files or network access, and the same text
//! always maps to the same vector.
//!
//! Reference: "Harmonic Token Projection: A Vocabulary-Free, Training-Free,
//! Deterministic, and Reversible Embedding Methodology", arXiv:2511.20665

use std::f64::consts::PI;

use crate::error::{Result, SearchError};

/// A fixed-length embedding vector
pub type Embedding = Vec<f32>;

/// HTP output dimension (two components per modulus)
pub const EMBEDDING_DIM: usize = 384;

const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Maximum token length in Unicode code points
const MAX_TOKEN_LENGTH: usize = 64;

/// First `NUM_MODULI` primes, pairwise coprime
static COPRIME_MODULI: &[u64] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181,
];

/// Turns text into fixed-dimension vectors.
///
/// Implementations must be deterministic for a given model and always return
/// vectors of length [`Embedder::dimension`].
pub trait Embedder: Send + Sync {
    /// Identifier of the model; indexes remember it so queries can be checked
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed several texts, one vector per input in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Check that a vector is usable against an index of dimension `expected`.
pub(crate) fn validate_vector(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(SearchError::embedding(format!(
            "expected {} dimensions, got {}",
            expected,
            vector.len()
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(SearchError::embedding("vector contains non-finite values"));
    }
    Ok(())
}

/// Harmonic Token Projection embedder
pub struct HtpEmbedder {
    moduli: Vec<u64>,
}

impl HtpEmbedder {
    pub const MODEL_ID: &'static str = "htp-384";

    pub fn new() -> Self {
        Self {
            moduli: COPRIME_MODULI[..NUM_MODULI].to_vec(),
        }
    }

    /// Project a single token: N mod m_i onto the unit circle for every modulus.
    fn embed_token(&self, token: &str) -> Vec<f64> {
        let n = token_to_integer(token);

        let mut embedding = Vec::with_capacity(EMBEDDING_DIM);
        for &m in &self.moduli {
            let r = n % m;
            let theta = 2.0 * PI * (r as f64) / (m as f64);
            embedding.push(theta.sin());
            embedding.push(theta.cos());
        }
        embedding
    }
}

impl Default for HtpEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HtpEmbedder {
    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Mean-pool the token projections, then L2 normalise.
    ///
    /// Text without any word tokens maps to the zero vector, which scores 0
    /// against everything.
    fn embed(&self, text: &str) -> Result<Embedding> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        let mut sum = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            for (acc, val) in sum.iter_mut().zip(self.embed_token(token)) {
                *acc += val;
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum {
            *val /= count;
        }

        let norm: f64 = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        let embedding = if norm > 0.0 {
            sum.iter().map(|x| (*x / norm) as f32).collect()
        } else {
            sum.iter().map(|x| *x as f32).collect()
        };

        Ok(embedding)
    }
}

/// Base-2^16 positional encoding of the token's code points, wrapping on overflow
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Lowercased words split on whitespace and ASCII punctuation
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Cosine similarity, clamped to [-1, 1].
///
/// Returns 0 when either vector has zero norm or the lengths differ; callers
/// that need a hard failure on length check dimensions first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    // f64 accumulation keeps finite f32 inputs from overflowing or underflowing
    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| x as f64 * y as f64).sum();
    let norm_a: f64 = a.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        ((dot / (norm_a * norm_b)) as f32).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
