//! # Recommendation Orchestrator
//!
//! Runs one request through the pipeline:
//! 1. Build the mood profile from the quiz answers
//! 2. Retrieve the K closest movies (with the request's filters)
//! 3. Let the refiner choose and justify one of them
//!
//! The encoder and index are loaded once and shared by every request.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use catalog::MovieIndex;
use embeddings::{HashingEncoder, HuggingFaceEncoder, SharedEncoder};
use llm_client::{GeminiClient, SharedGenerator};
use retrieval::{CandidateRetriever, MoodProfileBuilder, QuizAnswer, RetrievalContext};

use crate::config::{EncoderKind, RecommenderConfig};
use crate::error::{RecommendError, Result};
use crate::refiner::{Recommendation, RecommendationRefiner};

#[derive(Clone)]
pub struct RecommendationOrchestrator {
    index: Arc<MovieIndex>,
    profiles: MoodProfileBuilder,
    retriever: CandidateRetriever,
    refiner: RecommendationRefiner,
    candidate_count: usize,
}

impl RecommendationOrchestrator {
    /// Wire the pipeline from already-loaded resources.
    ///
    /// `generator` is `None` when the generative step is disabled.
    pub fn new(
        index: Arc<MovieIndex>,
        encoder: SharedEncoder,
        generator: Option<SharedGenerator>,
        config: &RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !index.is_empty() && index.dimension() != encoder.dimension() {
            return Err(RecommendError::Configuration(format!(
                "encoder '{}' produces {}-dimensional vectors \
                 but the catalog holds {}-dimensional embeddings",
                encoder.name(),
                encoder.dimension(),
                index.dimension()
            )));
        }

        let refiner = RecommendationRefiner::new(generator)
            .with_max_retries(config.max_retries)
            .with_timeout(config.llm_timeout())
            .with_alternatives(config.alternatives_count);

        Ok(Self {
            profiles: MoodProfileBuilder::new(encoder),
            retriever: CandidateRetriever::standard(Arc::clone(&index)),
            index,
            refiner,
            candidate_count: config.candidate_count,
        })
    }

    /// Load the catalog and build every client the configuration names
    pub fn from_config(config: &RecommenderConfig) -> Result<Self> {
        let index = MovieIndex::load_from_file(&config.catalog_path)?;
        info!(
            "Loaded {} movies from {}",
            index.len(),
            config.catalog_path.display()
        );
        let encoder = build_encoder(config)?;
        let generator = build_generator(config);
        Self::new(Arc::new(index), encoder, generator, config)
    }

    pub fn index(&self) -> &Arc<MovieIndex> {
        &self.index
    }

    pub fn uses_generator(&self) -> bool {
        self.refiner.has_generator()
    }

    /// Recommend one movie for these answers
    pub async fn recommend(&self, answers: &[QuizAnswer]) -> Result<Recommendation> {
        self.recommend_with_context(answers, &RetrievalContext::default())
            .await
    }

    /// Recommend one movie, honouring the request's filters
    #[instrument(skip_all, fields(answers = answers.len()))]
    pub async fn recommend_with_context(
        &self,
        answers: &[QuizAnswer],
        context: &RetrievalContext,
    ) -> Result<Recommendation> {
        let start_time = Instant::now();

        if answers.is_empty() {
            return Err(RecommendError::EmptyInput);
        }
        if self.index.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let profile = self.profiles.build(answers).await?;
        info!("Built mood profile from {} answers", answers.len());

        let candidates =
            self.retriever
                .retrieve_with_context(&profile, self.candidate_count, context)?;
        info!("Retrieved {} candidates", candidates.len());

        let recommendation = self.refiner.refine(&profile, &candidates).await?;

        info!(
            "Recommended movie {} ({}) in {:.2?}",
            recommendation.movie.id,
            recommendation.confidence,
            start_time.elapsed()
        );
        Ok(recommendation)
    }
}

/// The encoder the configuration selects
pub fn build_encoder(config: &RecommenderConfig) -> Result<SharedEncoder> {
    let encoder: SharedEncoder = match config.encoder {
        EncoderKind::Hashing => Arc::new(HashingEncoder::new(config.embedding_dim)?),
        EncoderKind::HuggingFace => {
            let api_key = config.huggingface_api_key().ok_or_else(|| {
                RecommendError::Configuration("missing Hugging Face API key".to_string())
            })?;
            Arc::new(HuggingFaceEncoder::new(api_key)?)
        }
    };
    info!("Using {} encoder ({} dimensions)", encoder.name(), encoder.dimension());
    Ok(encoder)
}

/// The generative model, or `None` when requests should use the fallback
pub fn build_generator(config: &RecommenderConfig) -> Option<SharedGenerator> {
    let Some(api_key) = config.gemini_api_key() else {
        info!("Generative model disabled, using similarity fallback");
        return None;
    };

    match GeminiClient::new(api_key, config.gemini_model.clone()) {
        Ok(client) => {
            let client = client.with_rate_limit(config.gemini_requests_per_minute);
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Gemini client unavailable, using similarity fallback: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Movie;

    fn encoder() -> SharedEncoder {
        Arc::new(HashingEncoder::new(4).unwrap())
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let index = MovieIndex::build(vec![Movie::new(1, "A", vec![1.0, 0.0])]).unwrap();

        let result = RecommendationOrchestrator::new(
            Arc::new(index),
            encoder(),
            None,
            &RecommenderConfig::default(),
        );

        assert!(matches!(result, Err(RecommendError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_empty_input_checked_first() {
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(MovieIndex::empty()),
            encoder(),
            None,
            &RecommenderConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            orchestrator.recommend(&[]).await,
            Err(RecommendError::EmptyInput)
        ));
        assert!(matches!(
            orchestrator.recommend(&[QuizAnswer::new("mood", "calm")]).await,
            Err(RecommendError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_mock_mode_builds_no_generator() {
        let config = RecommenderConfig {
            gemini_api_key: Some("secret".to_string()),
            llm_mock_mode: true,
            ..RecommenderConfig::default()
        };

        assert!(build_generator(&config).is_none());
    }

    #[test]
    fn test_api_key_builds_generator() {
        let config = RecommenderConfig {
            gemini_api_key: Some("secret".to_string()),
            ..RecommenderConfig::default()
        };

        let generator = build_generator(&config).unwrap();
        assert_eq!(generator.name(), "gemini");
    }
}
