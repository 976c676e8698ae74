use catalog::CatalogError;
use embeddings::EncoderError;
use thiserror::Error;

/// Errors raised while turning quiz answers into candidates
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// No quiz answers: there is no mood to encode
    #[error("No quiz answers were provided")]
    EmptyInput,

    /// A textual answer could not be parsed
    #[error("Invalid quiz answer '{0}': expected question=option")]
    MalformedAnswer(String),

    #[error("Failed to encode mood profile: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Candidate filter failed: {0}")]
    Filter(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
