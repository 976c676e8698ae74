//! Error types for the catalog crate.
//!
//! Every way a catalog can be unusable for similarity search has its own
//! variant, so callers can tell a malformed file apart from an index whose
//! embeddings disagree on dimensionality.

use crate::types::MovieId;
use thiserror::Error;

/// Errors that can occur while loading a catalog or querying the index
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open catalog file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a catalog
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a catalog file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Record could not be serialized back to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two catalog records share the same id
    #[error("Duplicate movie id {0}")]
    DuplicateMovie(MovieId),

    /// A movie has no precomputed embedding
    #[error("Movie {0} has no embedding")]
    MissingEmbedding(MovieId),

    /// An embedding contains NaN or infinite components
    #[error("Movie {0} has a non-finite embedding component")]
    InvalidEmbedding(MovieId),

    /// A vector does not have the dimensionality of the index
    ///
    /// `movie_id` is `None` when the offending vector is a query.
    #[error(
        "Embedding dimension mismatch (movie {movie_id:?}): expected {expected}, found {found}"
    )]
    DimensionMismatch {
        movie_id: Option<MovieId>,
        expected: usize,
        found: usize,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
