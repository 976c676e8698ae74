//! Streaming availability.

use crate::traits::Filter;
use crate::types::RetrievalContext;
use anyhow::Result;
use catalog::Candidate;

/// Keeps candidates available on at least one requested platform.
///
/// Platform names compare case-insensitively. "other" never constrains.
pub struct PlatformFilter;

impl Filter for PlatformFilter {
    fn name(&self) -> &str {
        "PlatformFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RetrievalContext,
    ) -> Result<Vec<Candidate>> {
        let platforms = context.effective_platforms();
        if platforms.is_empty() {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                candidate.movie.platforms.iter().any(|available| {
                    platforms
                        .iter()
                        .any(|wanted| available.eq_ignore_ascii_case(wanted))
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::{candidate, ids, movie};

    #[test]
    fn test_platform_filter() {
        let mut context = RetrievalContext::new();
        context.platforms = vec!["netflix".to_string(), "Other".to_string()];

        let candidates = vec![
            candidate(movie(1).with_platforms(["Netflix", "Prime Video"]), 0.9),
            candidate(movie(2).with_platforms(["Disney+"]), 0.8),
            candidate(movie(3), 0.7),
        ];

        let filtered = PlatformFilter.apply(candidates, &context).unwrap();

        assert_eq!(ids(&filtered), vec![1]);
    }

    #[test]
    fn test_only_other_is_unconstrained() {
        let mut context = RetrievalContext::new();
        context.platforms = vec!["other".to_string()];

        let candidates = vec![candidate(movie(1), 0.9)];

        assert_eq!(PlatformFilter.apply(candidates, &context).unwrap().len(), 1);
    }
}
