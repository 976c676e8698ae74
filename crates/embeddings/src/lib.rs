//! # Embeddings Crate
//!
//! Turns text (quiz answers, movie synopses) into fixed-length vectors.
//!
//! ## Components
//!
//! ### `Encoder` trait
//! The capability the rest of the pipeline depends on. Encoders are shared
//! as `Arc<dyn Encoder>`: the model (or HTTP client) is created once and
//! reused for every request.
//!
//! ### `HashingEncoder` (local)
//! Signed feature hashing of words and character trigrams. No model files,
//! no network, identical output in every process.
//!
//! ### `HuggingFaceEncoder` (remote)
//! `sentence-transformers/all-MiniLM-L6-v2` through the Hugging Face
//! inference API.
//!
//! Every encoder maps empty or whitespace-only text to the zero vector of
//! its dimension instead of failing.

pub mod error;
pub mod hashing;
pub mod huggingface;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{EncoderError, Result};
pub use hashing::HashingEncoder;
pub use huggingface::HuggingFaceEncoder;

/// Dimension of all-MiniLM-L6-v2 sentence embeddings
pub const DEFAULT_DIMENSION: usize = 384;

/// Text to fixed-dimension vectors.
///
/// Implementations must be deterministic for a fixed model version: the
/// movie catalog is embedded once, ahead of time, and compared against
/// query vectors computed later.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Length of every vector this encoder returns
    fn dimension(&self) -> usize;

    /// Encoder name for logging
    fn name(&self) -> &'static str;

    /// Encode one text
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode several texts, preserving order.
    ///
    /// Default implementation encodes one at a time. Remote encoders
    /// override it to send a single batched request.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.encode(text).await?);
        }
        Ok(embeddings)
    }
}

/// Shared handle to an encoder
pub type SharedEncoder = Arc<dyn Encoder>;

/// The neutral vector returned for empty input
pub fn zero_vector(dimension: usize) -> Vec<f32> {
    vec![0.0; dimension]
}

/// Whether `text` carries nothing to encode
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
