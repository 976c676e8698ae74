//! Local feature-hashing encoder.
//!
//! ## Algorithm
//! 1. Lower-case the text and split it into alphanumeric words
//! 2. Every word, and every character trigram of `<word>`, is hashed with
//!    64-bit FNV-1a
//! 3. The hash picks a bucket (`hash % dimension`) and a sign (bit 32), and
//!    the feature weight is added to that bucket
//! 4. The vector is scaled to unit length
//!
//! Trigrams let inflections ("melancholy" / "melancholic") still overlap.
//! FNV-1a is fixed by definition, so the same text maps to the same vector
//! in every process and on every platform.
//!
//! The vector is a bag of features: word order does not change it, so
//! reordered quiz answers encode to the same profile.

use crate::error::{EncoderError, Result};
use crate::{DEFAULT_DIMENSION, Encoder, is_blank, zero_vector};
use async_trait::async_trait;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic bag-of-features encoder
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EncoderError::Configuration(
                "hashing encoder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Synchronous encoding; the `Encoder` impl delegates here
    pub fn encode_text(&self, text: &str) -> Vec<f32> {
        let mut vector = zero_vector(self.dimension);
        if is_blank(text) {
            return vector;
        }

        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            self.add_feature(&mut vector, b'w', word, WORD_WEIGHT);

            let bounded: Vec<char> = std::iter::once('<')
                .chain(word.chars())
                .chain(std::iter::once('>'))
                .collect();
            for window in bounded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, b'c', &trigram, TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], namespace: u8, feature: &str, weight: f32) {
        let hash = fnv1a(namespace, feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

#[async_trait]
impl Encoder for HashingEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "hashing"
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode_text(text))
    }
}

/// 64-bit FNV-1a over a namespace byte followed by `bytes`
fn fnv1a(namespace: u8, bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in std::iter::once(&namespace).chain(bytes) {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
