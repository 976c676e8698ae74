use thiserror::Error;

/// Errors that can occur while encoding text
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embedding API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Encoder misconfigured: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, EncoderError>;
