//! Core domain types for the movie catalog.
//!
//! A [`Movie`] is owned by the catalog store and only ever read by the
//! recommendation pipeline. A [`Candidate`] pairs a shared movie with the
//! similarity score it earned against one query.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for a movie in the catalog
pub type MovieId = u32;

/// A fixed-length embedding vector
pub type Embedding = Vec<f32>;

/// A catalog movie with its precomputed embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Identifier in the upstream TMDB catalog, if synced from there
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u32>,
    pub title: String,
    /// Synopsis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Runtime in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u16>,
    /// Streaming platforms the movie is available on
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Average vote on a 0-10 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    /// Release date as `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Precomputed at catalog sync time. Empty until the movie is embedded.
    #[serde(default)]
    pub embedding: Embedding,
}

impl Movie {
    /// Create a movie with only the fields similarity search needs.
    pub fn new(id: MovieId, title: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            id,
            tmdb_id: None,
            title: title.into(),
            overview: None,
            genres: Vec::new(),
            runtime: None,
            platforms: Vec::new(),
            vote_average: None,
            release_date: None,
            embedding,
        }
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_runtime(mut self, minutes: u16) -> Self {
        self.runtime = Some(minutes);
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Release year parsed from `release_date`
    pub fn year(&self) -> Option<u16> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }

    /// Text that represents this movie when computing its embedding.
    ///
    /// Title, synopsis and genres joined by single spaces.
    pub fn embedding_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(2 + self.genres.len());
        if !self.title.is_empty() {
            parts.push(&self.title);
        }
        if let Some(overview) = self.overview.as_deref().filter(|o| !o.is_empty()) {
            parts.push(overview);
        }
        parts.extend(self.genres.iter().map(String::as_str));
        parts.join(" ")
    }

    /// Case-insensitive genre membership
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// A catalog movie scored against a query vector
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub movie: Arc<Movie>,
    /// Cosine similarity in [-1, 1]
    pub similarity_score: f32,
}

impl Candidate {
    pub fn new(movie: Arc<Movie>, similarity_score: f32) -> Self {
        Self {
            movie,
            similarity_score,
        }
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie.id
    }
}
