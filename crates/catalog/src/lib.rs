//! # Catalog Crate
//!
//! The read-only movie corpus the recommendation pipeline retrieves from.
//!
//! ## Main Components
//!
//! - **types**: `Movie`, `Candidate` and id/embedding aliases
//! - **parser**: read and write JSON-lines catalog files
//! - **index**: `MovieIndex`, cosine nearest-neighbour search
//! - **error**: error types for loading and querying
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::MovieIndex;
//! use std::path::Path;
//!
//! let index = MovieIndex::load_from_file(Path::new("data/catalog.jsonl"))?;
//! let candidates = index.nearest(&query_vector, 5)?;
//!
//! for candidate in &candidates {
//!     println!("{} ({:.3})", candidate.movie.title, candidate.similarity_score);
//! }
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

pub use error::{CatalogError, Result};
pub use index::MovieIndex;
pub use types::{Candidate, Embedding, Movie, MovieId};
