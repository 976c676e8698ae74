//! The Movie Vector Index.
//!
//! Holds one embedding per catalog movie and answers nearest-neighbour
//! queries by cosine similarity. The index is built once and is read-only
//! afterwards, so it can be shared across concurrent requests behind an
//! `Arc` without locking.
//!
//! ## Algorithm
//! 1. At build time, sort movies by id and L2-normalise every embedding
//! 2. At query time, normalise the query and score every movie with a dot
//!    product (in parallel with Rayon)
//! 3. Order by descending score, ties by ascending movie id
//! 4. Keep the top k (partial selection when k is smaller than the catalog)

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::{Candidate, Movie, MovieId};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Read-only similarity index over the catalog
#[derive(Debug, Clone, Default)]
pub struct MovieIndex {
    /// Movies sorted by ascending id
    movies: Vec<Arc<Movie>>,
    /// Unit-length (or zero) embeddings, same order as `movies`
    normalized: Vec<Vec<f32>>,
    /// Movie id -> position in `movies`
    positions: HashMap<MovieId, usize>,
    /// Shared embedding dimensionality; 0 for an empty index
    dimension: usize,
}

impl MovieIndex {
    /// Create an index with no movies
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from catalog records.
    ///
    /// Fails if two movies share an id, a movie has no embedding, an
    /// embedding is not finite, or embeddings disagree on dimensionality.
    pub fn build(mut movies: Vec<Movie>) -> Result<Self> {
        movies.sort_by_key(|movie| movie.id);

        for pair in movies.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(CatalogError::DuplicateMovie(pair[0].id));
            }
        }

        let dimension = movies.first().map(|m| m.embedding.len()).unwrap_or(0);
        for movie in &movies {
            if movie.embedding.is_empty() {
                return Err(CatalogError::MissingEmbedding(movie.id));
            }
            if movie.embedding.len() != dimension {
                return Err(CatalogError::DimensionMismatch {
                    movie_id: Some(movie.id),
                    expected: dimension,
                    found: movie.embedding.len(),
                });
            }
            if movie.embedding.iter().any(|x| !x.is_finite()) {
                return Err(CatalogError::InvalidEmbedding(movie.id));
            }
        }

        let normalized = movies
            .par_iter()
            .map(|movie| normalize(&movie.embedding))
            .collect();

        let positions = movies
            .iter()
            .enumerate()
            .map(|(pos, movie)| (movie.id, pos))
            .collect();

        let movies = movies.into_iter().map(Arc::new).collect();

        Ok(Self {
            movies,
            normalized,
            positions,
            dimension,
        })
    }

    /// Load a JSON-lines catalog and build the index from it
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading movie catalog from {:?}", path);
        let start = Instant::now();

        let movies = parser::parse_catalog(path)?;
        let index = Self::build(movies)?;

        info!(
            movies = index.len(),
            dimension = index.dimension(),
            "Movie index built in {:?}",
            start.elapsed()
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Embedding dimensionality shared by every movie (0 when empty)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get a movie by id
    pub fn get_movie(&self, id: MovieId) -> Option<&Arc<Movie>> {
        self.positions.get(&id).map(|&pos| &self.movies[pos])
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.positions.contains_key(&id)
    }

    /// All movies, ascending by id
    pub fn movies(&self) -> &[Arc<Movie>] {
        &self.movies
    }

    /// The `k` movies most similar to `query`, best first.
    ///
    /// Returns the whole catalog, ranked, when `k` is at least the catalog
    /// size.
    #[instrument(skip(self, query), fields(catalog = self.len()))]
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let mut scored = self.score_all(query)?;

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_by(rank_order);

        debug!(
            "Found {} nearest movies in {:?}",
            scored.len(),
            start.elapsed()
        );
        Ok(self.to_candidates(scored))
    }

    /// Every movie in the catalog, ranked against `query`
    pub fn ranked(&self, query: &[f32]) -> Result<Vec<Candidate>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self.score_all(query)?;
        scored.sort_by(rank_order);
        Ok(self.to_candidates(scored))
    }

    /// Score every movie against the query, as (position, similarity) pairs
    fn score_all(&self, query: &[f32]) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(CatalogError::DimensionMismatch {
                movie_id: None,
                expected: self.dimension,
                found: query.len(),
            });
        }

        let query = normalize(query);
        let scored = self
            .normalized
            .par_iter()
            .enumerate()
            .map(|(pos, embedding)| (pos, cosine_of_normalized(embedding, &query)))
            .collect();
        Ok(scored)
    }

    fn to_candidates(&self, scored: Vec<(usize, f32)>) -> Vec<Candidate> {
        scored
            .into_iter()
            .map(|(pos, score)| Candidate::new(Arc::clone(&self.movies[pos]), score))
            .collect()
    }
}

/// Descending score, then ascending position (which is ascending movie id)
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Scale to unit length. Zero vectors stay zero.
fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return vec![0.0; vector.len()];
    }
    vector.iter().map(|x| x / norm).collect()
}

/// Dot product of two unit vectors, clamped to the cosine range
fn cosine_of_normalized(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    if dot.is_finite() {
        dot.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
