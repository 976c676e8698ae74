use catalog::CatalogError;
use embeddings::EncoderError;
use retrieval::RetrievalError;
use thiserror::Error;

/// Errors a recommendation request (or the wiring behind it) can surface.
///
/// Generative model failures never appear here: the refiner absorbs them.
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("No quiz answers were provided")]
    EmptyInput,

    #[error("The movie catalog is empty")]
    EmptyCatalog,

    /// Retrieval produced nothing to choose from (e.g. K = 0)
    #[error("No candidate movies to recommend from")]
    NoCandidates,

    #[error("Failed to embed the mood profile: {0}")]
    Embedding(EncoderError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Candidate retrieval failed: {0}")]
    Retrieval(RetrievalError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl From<RetrievalError> for RecommendError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::EmptyInput => RecommendError::EmptyInput,
            RetrievalError::Encoder(e) => RecommendError::Embedding(e),
            RetrievalError::Catalog(e) => RecommendError::Catalog(e),
            other => RecommendError::Retrieval(other),
        }
    }
}

impl From<EncoderError> for RecommendError {
    fn from(err: EncoderError) -> Self {
        RecommendError::Embedding(err)
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
