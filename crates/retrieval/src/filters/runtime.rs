//! Keeps movies that fit the time the user has.

use crate::traits::Filter;
use crate::types::{DurationPreference, RetrievalContext};
use anyhow::Result;
use catalog::Candidate;

pub struct RuntimeFilter;

impl Filter for RuntimeFilter {
    fn name(&self) -> &str {
        "RuntimeFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RetrievalContext,
    ) -> Result<Vec<Candidate>> {
        if context.duration == DurationPreference::Any {
            return Ok(candidates);
        }
        Ok(candidates
            .into_iter()
            .filter(|candidate| context.duration.accepts(candidate.movie.runtime))
            .collect())
    }
}
