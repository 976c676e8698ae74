//! Drops movies the user has already seen.

use crate::traits::Filter;
use crate::types::RetrievalContext;
use anyhow::Result;
use catalog::Candidate;

/// Removes candidates listed in `RetrievalContext::seen_movies`
pub struct AlreadySeenFilter;

impl Filter for AlreadySeenFilter {
    fn name(&self) -> &str {
        "AlreadySeenFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RetrievalContext,
    ) -> Result<Vec<Candidate>> {
        if context.seen_movies.is_empty() {
            return Ok(candidates);
        }
        Ok(candidates
            .into_iter()
            .filter(|candidate| !context.seen_movies.contains(&candidate.movie_id()))
            .collect())
    }
}
