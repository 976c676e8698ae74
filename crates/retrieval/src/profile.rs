//! Mood Profile Builder.
//!
//! Aggregates an ordered sequence of quiz answers into one composite
//! description and encodes it. Answer order is preserved: later answers
//! refine earlier ones. Whether the embedding itself reflects that order
//! depends on the encoder; the local hashing encoder ignores it.

use crate::error::{Result, RetrievalError};
use crate::types::{MoodProfile, QuizAnswer};
use embeddings::{EncoderError, SharedEncoder};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct MoodProfileBuilder {
    encoder: SharedEncoder,
}

impl MoodProfileBuilder {
    pub fn new(encoder: SharedEncoder) -> Self {
        Self { encoder }
    }

    /// Dimension of the profiles this builder produces
    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// One `question: option` line per answer, in answer order.
    ///
    /// Answers with a blank option are skipped.
    pub fn composite_text(answers: &[QuizAnswer]) -> String {
        answers
            .iter()
            .filter(|answer| !answer.selected_option.trim().is_empty())
            .map(|answer| {
                format!(
                    "{}: {}",
                    answer.question_id.trim(),
                    answer.selected_option.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the mood profile for one request.
    ///
    /// Fails with `EmptyInput` when there are no answers. If every answer is
    /// blank the profile carries the encoder's zero vector.
    #[instrument(skip_all, fields(answers = answers.len(), encoder = self.encoder.name()))]
    pub async fn build(&self, answers: &[QuizAnswer]) -> Result<MoodProfile> {
        if answers.is_empty() {
            return Err(RetrievalError::EmptyInput);
        }

        let composite_text = Self::composite_text(answers);
        let embedding = self.encoder.encode(&composite_text).await?;

        let expected = self.encoder.dimension();
        if embedding.len() != expected {
            return Err(EncoderError::DimensionMismatch {
                expected,
                found: embedding.len(),
            }
            .into());
        }

        debug!(chars = composite_text.len(), "Built mood profile");
        Ok(MoodProfile {
            composite_text,
            embedding,
        })
    }
}
