//! # Retrieval
//!
//! Turns quiz answers into a ranked, bounded set of candidate movies.
//!
//! - [`MoodProfileBuilder`] folds the answers into one composite text and
//!   encodes it with the shared [`embeddings::Encoder`].
//! - [`CandidateRetriever`] queries the [`catalog::MovieIndex`] with that
//!   profile, optionally narrowing the ranking with a [`FilterPipeline`].
//!
//! Filters are the extension point: implement [`Filter`] and add it to a
//! pipeline.

pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod profile;
pub mod retriever;
pub mod traits;
pub mod types;

pub use error::{Result, RetrievalError};
pub use filter_pipeline::FilterPipeline;
pub use profile::MoodProfileBuilder;
pub use retriever::CandidateRetriever;
pub use traits::Filter;
pub use types::{DurationPreference, MoodProfile, QuizAnswer, RetrievalContext};
