//! Genre inclusion and exclusion.

use crate::traits::Filter;
use crate::types::RetrievalContext;
use anyhow::Result;
use catalog::Candidate;

/// Keeps candidates sharing at least one wanted genre and drops any
/// carrying an excluded genre. Matching is case-insensitive.
pub struct GenreFilter;

impl Filter for GenreFilter {
    fn name(&self) -> &str {
        "GenreFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RetrievalContext,
    ) -> Result<Vec<Candidate>> {
        let wanted = context.effective_wanted_genres();
        let excluded = &context.excluded_genres;
        if wanted.is_empty() && excluded.is_empty() {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                let movie = &candidate.movie;
                let has_wanted = wanted.is_empty() || wanted.iter().any(|g| movie.has_genre(g));
                let has_excluded = excluded.iter().any(|g| movie.has_genre(g));
                has_wanted && !has_excluded
            })
            .collect())
    }
}
