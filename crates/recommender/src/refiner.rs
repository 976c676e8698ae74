//! Recommendation Refiner.
//!
//! Asks the generative model to pick one movie from the retrieved
//! candidates and justify it. The model is fallible and untrusted, so the
//! exchange runs as a small state machine:
//!
//! ```text
//! AwaitingModel ──response ok──▶ Validated ──▶ Done
//!      │  ▲
//!      │  └──retry (bounded)── InvalidResponse
//!      │                            │ retries exhausted
//!      └──unavailable / timeout─────┴──────▶ Fallback ──▶ Done
//! ```
//!
//! Transitions are plain functions; [`RecommendationRefiner::refine`] only
//! adds the model call. A refined request never fails because of the model:
//! `Fallback` recommends the top-ranked candidate with a canned
//! justification.

use crate::error::{RecommendError, Result};
use crate::prompt::{self, ModelChoice, Rejection};
use crate::templates;
use catalog::{Candidate, Movie};
use llm_client::{GenerationError, SharedGenerator};
use retrieval::MoodProfile;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ALTERNATIVES: usize = 4;

/// How the recommended movie was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The generative model chose it and its choice was validated
    LlmSelected,
    /// The top similarity candidate, chosen without the model
    SimilarityFallback,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::LlmSelected => write!(f, "llm_selected"),
            Confidence::SimilarityFallback => write!(f, "similarity_fallback"),
        }
    }
}

/// A secondary pick shown next to the recommendation
#[derive(Debug, Clone, Serialize)]
pub struct Alternative {
    pub movie: Arc<Movie>,
    pub similarity_score: f32,
    pub tagline: String,
}

/// The system's answer to one request
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub movie: Arc<Movie>,
    pub similarity_score: f32,
    pub justification: String,
    pub confidence: Confidence,
    pub alternatives: Vec<Alternative>,
}

/// Why the model's answer was not used
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Mock mode, or no API key
    NoGenerator,
    Unavailable(String),
    TimedOut(Duration),
    /// Every allowed attempt produced an invalid response
    RetriesExhausted(Rejection),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoGenerator => write!(f, "no generative model configured"),
            FallbackReason::Unavailable(reason) => write!(f, "model unavailable: {reason}"),
            FallbackReason::TimedOut(limit) => write!(f, "model timed out after {limit:?}"),
            FallbackReason::RetriesExhausted(rejection) => {
                write!(f, "invalid model responses: {rejection}")
            }
        }
    }
}

/// What came back from one model call
#[derive(Debug)]
pub enum ModelOutcome {
    Responded(String),
    Failed(GenerationError),
    TimedOut(Duration),
}

#[derive(Debug, Clone)]
pub enum RefinerState {
    /// `attempt` counts from 0; attempt `n` is retry number `n`
    AwaitingModel { attempt: u32 },
    InvalidResponse { attempt: u32, reason: Rejection },
    Validated(ModelChoice),
    Fallback(FallbackReason),
    Done(Recommendation),
}

/// Initial state: without a generator there is nothing to wait for
pub fn initial_state(has_generator: bool) -> RefinerState {
    if has_generator {
        RefinerState::AwaitingModel { attempt: 0 }
    } else {
        RefinerState::Fallback(FallbackReason::NoGenerator)
    }
}

/// `AwaitingModel` after the model call completes
pub fn on_model_outcome(
    attempt: u32,
    outcome: ModelOutcome,
    candidates: &[Candidate],
) -> RefinerState {
    match outcome {
        ModelOutcome::Responded(text) => match prompt::parse_response(&text, candidates) {
            Ok(choice) => RefinerState::Validated(choice),
            Err(reason) => RefinerState::InvalidResponse { attempt, reason },
        },
        // the provider answered, but with nothing usable
        ModelOutcome::Failed(GenerationError::EmptyResponse) => RefinerState::InvalidResponse {
            attempt,
            reason: Rejection::NotJson("empty response".to_string()),
        },
        ModelOutcome::Failed(GenerationError::InvalidResponse(reason)) => {
            RefinerState::InvalidResponse {
                attempt,
                reason: Rejection::NotJson(reason),
            }
        }
        ModelOutcome::Failed(GenerationError::Timeout(limit)) | ModelOutcome::TimedOut(limit) => {
            RefinerState::Fallback(FallbackReason::TimedOut(limit))
        }
        ModelOutcome::Failed(err) => {
            RefinerState::Fallback(FallbackReason::Unavailable(err.to_string()))
        }
    }
}

/// `InvalidResponse` moves to a retry while attempts remain
pub fn after_invalid(attempt: u32, reason: Rejection, max_retries: u32) -> RefinerState {
    if attempt < max_retries {
        RefinerState::AwaitingModel {
            attempt: attempt + 1,
        }
    } else {
        RefinerState::Fallback(FallbackReason::RetriesExhausted(reason))
    }
}

/// Turns candidates into one justified recommendation
#[derive(Clone)]
pub struct RecommendationRefiner {
    generator: Option<SharedGenerator>,
    max_retries: u32,
    timeout: Duration,
    alternatives: usize,
}

impl RecommendationRefiner {
    /// `None` means every request is answered by the similarity fallback
    pub fn new(generator: Option<SharedGenerator>) -> Self {
        Self {
            generator,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            alternatives: DEFAULT_ALTERNATIVES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_alternatives(mut self, alternatives: usize) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Choose and justify one of `candidates` (ranked, best first).
    ///
    /// Only fails when `candidates` is empty.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn refine(
        &self,
        profile: &MoodProfile,
        candidates: &[Candidate],
    ) -> Result<Recommendation> {
        if candidates.is_empty() {
            return Err(RecommendError::NoCandidates);
        }

        let base_prompt =
            prompt::build_prompt(&profile.composite_text, candidates, self.alternatives);
        let mut request_prompt = base_prompt.clone();
        let mut state = initial_state(self.generator.is_some());

        loop {
            state = match state {
                RefinerState::AwaitingModel { attempt } => match &self.generator {
                    Some(generator) => {
                        debug!(attempt, generator = generator.name(), "Calling generative model");
                        let outcome = self.call_model(generator, &request_prompt).await;
                        on_model_outcome(attempt, outcome, candidates)
                    }
                    None => RefinerState::Fallback(FallbackReason::NoGenerator),
                },
                RefinerState::InvalidResponse { attempt, reason } => {
                    warn!(attempt, "Rejected model response: {}", reason);
                    let note = prompt::corrective_note(&reason);
                    request_prompt = format!("{base_prompt}{note}");
                    after_invalid(attempt, reason, self.max_retries)
                }
                RefinerState::Validated(choice) => {
                    RefinerState::Done(self.model_recommendation(choice, profile, candidates))
                }
                RefinerState::Fallback(reason) => {
                    if reason == FallbackReason::NoGenerator {
                        debug!("Using similarity fallback: {}", reason);
                    } else {
                        warn!("Using similarity fallback: {}", reason);
                    }
                    RefinerState::Done(self.fallback_recommendation(profile, candidates))
                }
                RefinerState::Done(recommendation) => {
                    info!(
                        movie_id = recommendation.movie.id,
                        confidence = %recommendation.confidence,
                        "Refined recommendation"
                    );
                    return Ok(recommendation);
                }
            };
        }
    }

    async fn call_model(&self, generator: &SharedGenerator, prompt: &str) -> ModelOutcome {
        // dropping the future on timeout cancels the in-flight request
        match timeout(self.timeout, generator.generate(prompt)).await {
            Ok(Ok(text)) => ModelOutcome::Responded(text),
            Ok(Err(err)) => ModelOutcome::Failed(err),
            Err(_) => ModelOutcome::TimedOut(self.timeout),
        }
    }

    fn model_recommendation(
        &self,
        choice: ModelChoice,
        profile: &MoodProfile,
        candidates: &[Candidate],
    ) -> Recommendation {
        let Some(primary) = candidates.iter().find(|c| c.movie_id() == choice.movie_id) else {
            // parse_response only accepts candidate ids
            return self.fallback_recommendation(profile, candidates);
        };

        let mut used = HashSet::from([primary.movie_id()]);
        let mut alternatives = Vec::with_capacity(self.alternatives);
        for pick in &choice.secondary {
            if alternatives.len() == self.alternatives {
                break;
            }
            if let Some(candidate) = candidates.iter().find(|c| c.movie_id() == pick.movie_id) {
                if used.insert(candidate.movie_id()) {
                    let tagline = pick.tagline.clone().unwrap_or_else(|| {
                        templates::fallback_tagline(primary.movie_id(), alternatives.len())
                            .to_string()
                    });
                    alternatives.push(alternative(candidate, tagline));
                }
            }
        }
        self.top_up(&mut alternatives, &mut used, primary.movie_id(), candidates);

        Recommendation {
            movie: Arc::clone(&primary.movie),
            similarity_score: primary.similarity_score,
            justification: choice.reasoning,
            confidence: Confidence::LlmSelected,
            alternatives,
        }
    }

    /// The top-ranked candidate with a templated justification
    fn fallback_recommendation(
        &self,
        profile: &MoodProfile,
        candidates: &[Candidate],
    ) -> Recommendation {
        let top = &candidates[0];
        let mut used = HashSet::from([top.movie_id()]);
        let mut alternatives = Vec::with_capacity(self.alternatives);
        self.top_up(&mut alternatives, &mut used, top.movie_id(), candidates);

        Recommendation {
            movie: Arc::clone(&top.movie),
            similarity_score: top.similarity_score,
            justification: templates::fallback_justification(&profile.composite_text, &top.movie),
            confidence: Confidence::SimilarityFallback,
            alternatives,
        }
    }

    /// Fill remaining alternative slots in similarity order
    fn top_up(
        &self,
        alternatives: &mut Vec<Alternative>,
        used: &mut HashSet<catalog::MovieId>,
        seed: catalog::MovieId,
        candidates: &[Candidate],
    ) {
        for candidate in candidates {
            if alternatives.len() >= self.alternatives {
                break;
            }
            if used.insert(candidate.movie_id()) {
                let tagline = templates::fallback_tagline(seed, alternatives.len()).to_string();
                alternatives.push(alternative(candidate, tagline));
            }
        }
    }
}

fn alternative(candidate: &Candidate, tagline: String) -> Alternative {
    Alternative {
        movie: Arc::clone(&candidate.movie),
        similarity_score: candidate.similarity_score,
        tagline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_client::TextGenerator;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned responses in order, then reports itself unavailable
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<std::result::Result<String, GenerationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<std::result::Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".into())))
        }
    }

    struct SlowGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    fn candidates() -> Vec<Candidate> {
        (1..=6)
            .map(|id| {
                let movie = Movie::new(id, format!("Movie {id}"), vec![1.0]).with_genres(["Drama"]);
                Candidate::new(Arc::new(movie), 1.0 - id as f32 / 10.0)
            })
            .collect()
    }

    fn profile() -> MoodProfile {
        MoodProfile {
            composite_text: "mood: melancholic\npace: slow".to_string(),
            embedding: vec![1.0],
        }
    }

    fn valid(id: u32) -> std::result::Result<String, GenerationError> {
        Ok(format!(
            r#"{{"primary": {{"film_id": {id}, "title": "Movie {id}",
                             "reasoning": "Fits the mood."}},
               "secondary": [{{"film_id": 5, "title": "Movie 5", "tagline": "Also good"}}]}}"#
        ))
    }

    #[test]
    fn test_initial_state() {
        assert!(matches!(
            initial_state(true),
            RefinerState::AwaitingModel { attempt: 0 }
        ));
        assert!(matches!(
            initial_state(false),
            RefinerState::Fallback(FallbackReason::NoGenerator)
        ));
    }

    #[test]
    fn test_valid_response_is_validated() {
        let state = on_model_outcome(
            0,
            ModelOutcome::Responded(valid(3).unwrap()),
            &candidates(),
        );

        match state {
            RefinerState::Validated(choice) => assert_eq!(choice.movie_id, 3),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_set_id_is_invalid() {
        let state = on_model_outcome(
            0,
            ModelOutcome::Responded(valid(42).unwrap()),
            &candidates(),
        );

        assert!(matches!(
            state,
            RefinerState::InvalidResponse {
                attempt: 0,
                reason: Rejection::UnknownFilm(_)
            }
        ));
    }

    #[test]
    fn test_unavailable_and_timeout_skip_retries() {
        let unavailable = on_model_outcome(
            0,
            ModelOutcome::Failed(GenerationError::Unavailable("down".into())),
            &candidates(),
        );
        let timed_out = on_model_outcome(
            0,
            ModelOutcome::TimedOut(DEFAULT_TIMEOUT),
            &candidates(),
        );

        assert!(matches!(
            unavailable,
            RefinerState::Fallback(FallbackReason::Unavailable(_))
        ));
        assert!(matches!(
            timed_out,
            RefinerState::Fallback(FallbackReason::TimedOut(_))
        ));
    }

    #[test]
    fn test_retry_is_bounded() {
        assert!(matches!(
            after_invalid(0, Rejection::MissingPrimary, 1),
            RefinerState::AwaitingModel { attempt: 1 }
        ));
        assert!(matches!(
            after_invalid(1, Rejection::MissingPrimary, 1),
            RefinerState::Fallback(FallbackReason::RetriesExhausted(Rejection::MissingPrimary))
        ));
        assert!(matches!(
            after_invalid(0, Rejection::MissingPrimary, 0),
            RefinerState::Fallback(_)
        ));
    }

    #[tokio::test]
    async fn test_model_choice_is_used() {
        let generator = ScriptedGenerator::new(vec![valid(3)]);
        let refiner = RecommendationRefiner::new(Some(generator.clone()));

        let rec = refiner.refine(&profile(), &candidates()).await.unwrap();

        assert_eq!(rec.movie.id, 3);
        assert_eq!(rec.confidence, Confidence::LlmSelected);
        assert_eq!(rec.justification, "Fits the mood.");
        let alternative_ids: Vec<_> = rec.alternatives.iter().map(|a| a.movie.id).collect();
        assert_eq!(alternative_ids, vec![5, 1, 2, 4]);
        assert_eq!(rec.alternatives[0].tagline, "Also good");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_then_valid_retries_with_note() {
        let generator = ScriptedGenerator::new(vec![Ok("not json".to_string()), valid(2)]);
        let refiner = RecommendationRefiner::new(Some(generator.clone()));

        let rec = refiner.refine(&profile(), &candidates()).await.unwrap();

        assert_eq!(rec.movie.id, 2);
        assert_eq!(rec.confidence, Confidence::LlmSelected);
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("REJECTED"));
    }

    #[tokio::test]
    async fn test_repeated_invalid_falls_back() {
        let generator = ScriptedGenerator::new(vec![valid(99), valid(98), valid(2)]);
        let refiner = RecommendationRefiner::new(Some(generator.clone()));

        let rec = refiner.refine(&profile(), &candidates()).await.unwrap();

        assert_eq!(rec.movie.id, 1);
        assert_eq!(rec.confidence, Confidence::SimilarityFallback);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back_without_retry() {
        let generator = ScriptedGenerator::new(vec![Err(GenerationError::Api {
            status: 503,
            body: "overloaded".into(),
        })]);
        let refiner = RecommendationRefiner::new(Some(generator.clone())).with_max_retries(3);

        let rec = refiner.refine(&profile(), &candidates()).await.unwrap();

        assert_eq!(rec.movie.id, 1);
        assert_eq!(rec.confidence, Confidence::SimilarityFallback);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_top_candidate() {
        let generator = Arc::new(SlowGenerator {
            calls: AtomicUsize::new(0),
        });
        let refiner = RecommendationRefiner::new(Some(generator.clone()))
            .with_timeout(Duration::from_millis(20));

        let rec = refiner.refine(&profile(), &candidates()).await.unwrap();

        assert_eq!(rec.movie.id, 1);
        assert_eq!(rec.confidence, Confidence::SimilarityFallback);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_generator_uses_templates() {
        let refiner = RecommendationRefiner::new(None).with_alternatives(2);

        let rec = refiner.refine(&profile(), &candidates()).await.unwrap();

        assert_eq!(rec.movie.id, 1);
        assert_eq!(rec.confidence, Confidence::SimilarityFallback);
        assert!(rec.justification.contains("drama"));
        let alternative_ids: Vec<_> = rec.alternatives.iter().map(|a| a.movie.id).collect();
        assert_eq!(alternative_ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let refiner = RecommendationRefiner::new(None);

        let err = refiner.refine(&profile(), &[]).await.unwrap_err();

        assert!(matches!(err, RecommendError::NoCandidates));
    }

    #[test]
    fn test_confidence_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Confidence::SimilarityFallback).unwrap(),
            "\"similarity_fallback\""
        );
    }
}
