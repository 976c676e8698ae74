//! Generative model client.
//!
//! This crate provides the capability the recommendation refiner uses to
//! talk to a generative language model:
//! - the `TextGenerator` trait (`generate(prompt) -> text`)
//! - `GeminiClient`, the production provider (Gemini REST API)
//! - `RateLimiter`, a sliding-window requests-per-minute limiter
//!
//! The model is an untrusted black box: nothing here interprets its output.
//! Validation happens in the caller.

pub mod gemini;
pub mod rate_limiter;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use gemini::GeminiClient;
pub use rate_limiter::RateLimiter;

/// Errors that can occur when calling a generative model
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to reach the model provider: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response from model provider: {0}")]
    InvalidResponse(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Model provider unavailable: {0}")]
    Unavailable(String),
}

/// A generative language model: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Shared handle to a generator
pub type SharedGenerator = Arc<dyn TextGenerator>;
