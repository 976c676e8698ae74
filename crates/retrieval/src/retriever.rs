//! Candidate Retriever: the mood profile against the movie index.

use crate::error::Result;
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadySeenFilter, GenreFilter, PlatformFilter, RuntimeFilter};
use crate::types::{MoodProfile, RetrievalContext};
use catalog::{Candidate, MovieIndex};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Produces a bounded, ranked candidate set for one mood profile.
///
/// Cheap to clone; the index and filters are shared.
#[derive(Clone)]
pub struct CandidateRetriever {
    index: Arc<MovieIndex>,
    filters: Arc<FilterPipeline>,
}

impl CandidateRetriever {
    /// A retriever with no filters
    pub fn new(index: Arc<MovieIndex>) -> Self {
        Self {
            index,
            filters: Arc::new(FilterPipeline::new()),
        }
    }

    /// A retriever with every supplied filter
    pub fn standard(index: Arc<MovieIndex>) -> Self {
        Self::new(index).with_filters(
            FilterPipeline::new()
                .add_filter(AlreadySeenFilter)
                .add_filter(GenreFilter)
                .add_filter(RuntimeFilter)
                .add_filter(PlatformFilter),
        )
    }

    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.filters = Arc::new(filters);
        self
    }

    pub fn index(&self) -> &Arc<MovieIndex> {
        &self.index
    }

    /// The `k` movies closest to the profile
    pub fn retrieve(&self, profile: &MoodProfile, k: usize) -> Result<Vec<Candidate>> {
        Ok(self.index.nearest(&profile.embedding, k)?)
    }

    /// The `k` closest movies that pass every filter.
    ///
    /// If the filters reject the whole catalog the unfiltered top `k` is
    /// returned instead.
    #[instrument(skip_all, fields(k = k))]
    pub fn retrieve_with_context(
        &self,
        profile: &MoodProfile,
        k: usize,
        context: &RetrievalContext,
    ) -> Result<Vec<Candidate>> {
        if k == 0 || self.filters.is_empty() || context.is_unconstrained() {
            return self.retrieve(profile, k);
        }

        let ranked = self.index.ranked(&profile.embedding)?;
        let total = ranked.len();
        let mut kept = self.filters.apply(ranked, context)?;

        if kept.is_empty() && total > 0 {
            warn!(
                "Filters {:?} removed all {} movies, using unfiltered ranking",
                self.filters.names(),
                total
            );
            return self.retrieve(profile, k);
        }

        debug!("{} of {} movies passed the filters", kept.len(), total);
        kept.truncate(k);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DurationPreference;
    use catalog::Movie;

    fn index() -> Arc<MovieIndex> {
        let movies = vec![
            Movie::new(1, "Close", vec![1.0, 0.0])
                .with_genres(["Drama"])
                .with_runtime(100),
            Movie::new(2, "Near", vec![0.9, 0.1])
                .with_genres(["Comedy"])
                .with_runtime(80),
            Movie::new(3, "Far", vec![0.0, 1.0])
                .with_genres(["Drama"])
                .with_runtime(150),
            Movie::new(4, "Opposite", vec![-1.0, 0.0])
                .with_genres(["Horror"])
                .with_runtime(85),
        ];
        Arc::new(MovieIndex::build(movies).unwrap())
    }

    fn profile() -> MoodProfile {
        MoodProfile {
            composite_text: "mood: calm".to_string(),
            embedding: vec![1.0, 0.0],
        }
    }

    #[test]
    fn test_retrieve_is_bounded_by_k_and_catalog() {
        let retriever = CandidateRetriever::new(index());

        assert_eq!(retriever.retrieve(&profile(), 2).unwrap().len(), 2);
        assert_eq!(retriever.retrieve(&profile(), 50).unwrap().len(), 4);
        assert!(retriever.retrieve(&profile(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_unconstrained_context_matches_nearest() {
        let retriever = CandidateRetriever::standard(index());

        let plain: Vec<_> = retriever
            .retrieve(&profile(), 3)
            .unwrap()
            .iter()
            .map(Candidate::movie_id)
            .collect();
        let filtered: Vec<_> = retriever
            .retrieve_with_context(&profile(), 3, &RetrievalContext::new())
            .unwrap()
            .iter()
            .map(Candidate::movie_id)
            .collect();

        assert_eq!(plain, vec![1, 2, 3]);
        assert_eq!(plain, filtered);
    }

    #[test]
    fn test_filters_applied_before_truncation() {
        let retriever = CandidateRetriever::standard(index());
        let mut context = RetrievalContext::new();
        context.duration = DurationPreference::Short;

        let candidates = retriever
            .retrieve_with_context(&profile(), 1, &context)
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].movie_id(), 2);
    }

    #[test]
    fn test_over_restrictive_filters_fall_back() {
        let retriever = CandidateRetriever::standard(index());
        let mut context = RetrievalContext::new();
        context.wanted_genres = vec!["Western".to_string()];

        let candidates = retriever
            .retrieve_with_context(&profile(), 2, &context)
            .unwrap();

        let ids: Vec<_> = candidates.iter().map(Candidate::movie_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_dimension_mismatch_is_catalog_error() {
        let retriever = CandidateRetriever::new(index());
        let bad = MoodProfile {
            composite_text: String::new(),
            embedding: vec![1.0, 0.0, 0.0],
        };

        assert!(matches!(
            retriever.retrieve(&bad, 2),
            Err(crate::RetrievalError::Catalog(_))
        ));
    }
}
