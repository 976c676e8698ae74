//! # Recommender
//!
//! Quiz answers in, one justified movie recommendation out.
//!
//! [`RecommendationOrchestrator`] wires the mood profile builder and the
//! candidate retriever (from `retrieval`) to the [`RecommendationRefiner`],
//! which lets a generative model pick among the candidates and falls back
//! to pure similarity whenever the model cannot be used.
//!
//! The only errors a caller sees are [`RecommendError`] variants: the
//! refiner absorbs every model failure.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod refiner;
pub mod templates;

pub use config::{EncoderKind, RecommenderConfig};
pub use error::{RecommendError, Result};
pub use orchestrator::RecommendationOrchestrator;
pub use refiner::{Alternative, Confidence, Recommendation, RecommendationRefiner};
