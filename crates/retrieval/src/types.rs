//! Request-scoped types: what the user answered, the mood derived from it,
//! and the constraints retrieval should honour.

use crate::error::RetrievalError;
use catalog::MovieId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// One answered quiz question. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnswer")]
pub struct QuizAnswer {
    pub question_id: String,
    /// Option identifier or free text
    pub selected_option: String,
}

impl QuizAnswer {
    pub fn new(question_id: impl Into<String>, selected_option: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            selected_option: selected_option.into(),
        }
    }
}

impl fmt::Display for QuizAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.question_id, self.selected_option)
    }
}

/// Parses `question=option`, as typed on a command line
impl FromStr for QuizAnswer {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (question, option) = s
            .split_once('=')
            .ok_or_else(|| RetrievalError::MalformedAnswer(s.to_string()))?;
        let question = question.trim();
        if question.is_empty() {
            return Err(RetrievalError::MalformedAnswer(s.to_string()));
        }
        Ok(Self::new(question, option.trim()))
    }
}

/// Accepted JSON shapes: `{"question_id": "mood", "selected_option": "calm"}`
/// or the shorthand `{"mood": "calm"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Full {
        question_id: String,
        selected_option: String,
    },
    Pair(BTreeMap<String, String>),
}

impl TryFrom<RawAnswer> for QuizAnswer {
    type Error = String;

    fn try_from(raw: RawAnswer) -> Result<Self, Self::Error> {
        match raw {
            RawAnswer::Full {
                question_id,
                selected_option,
            } => Ok(Self::new(question_id, selected_option)),
            RawAnswer::Pair(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "expected a single question/option pair, found {} entries",
                        map.len()
                    ));
                }
                let (question, option) = map.into_iter().next().ok_or("empty answer")?;
                Ok(Self::new(question, option))
            }
        }
    }
}

/// The retrieval query derived from one request's answers.
///
/// Created per request and discarded after use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodProfile {
    pub composite_text: String,
    pub embedding: Vec<f32>,
}

/// How long the user has, as selected in the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DurationPreference {
    #[default]
    Any,
    /// Under 90 minutes
    Short,
    /// 90 to 120 minutes inclusive
    Standard,
    /// Over 120 minutes
    Long,
}

impl DurationPreference {
    /// Whether a movie with this runtime fits. Unknown runtimes only fit `Any`.
    pub fn accepts(self, runtime: Option<u16>) -> bool {
        match (self, runtime) {
            (DurationPreference::Any, _) => true,
            (_, None) => false,
            (DurationPreference::Short, Some(minutes)) => minutes < 90,
            (DurationPreference::Standard, Some(minutes)) => (90..=120).contains(&minutes),
            (DurationPreference::Long, Some(minutes)) => minutes > 120,
        }
    }
}

impl FromStr for DurationPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "" => Ok(Self::Any),
            "<90" | "short" => Ok(Self::Short),
            "90-120" | "standard" => Ok(Self::Standard),
            ">120" | "long" => Ok(Self::Long),
            other => Err(format!(
                "unknown duration '{other}' (expected <90, 90-120, >120 or any)"
            )),
        }
    }
}

/// Per-request constraints consumed by the candidate filters
#[derive(Debug, Clone, Default)]
pub struct RetrievalContext {
    /// Movies the user has already seen
    pub seen_movies: HashSet<MovieId>,
    /// Keep movies with at least one of these genres; "surprise" disables
    pub wanted_genres: Vec<String>,
    pub excluded_genres: Vec<String>,
    pub duration: DurationPreference,
    /// Keep movies on at least one of these platforms; "other" is ignored
    pub platforms: Vec<String>,
}

impl RetrievalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no filter would remove anything
    pub fn is_unconstrained(&self) -> bool {
        self.seen_movies.is_empty()
            && self.effective_wanted_genres().is_empty()
            && self.excluded_genres.is_empty()
            && self.duration == DurationPreference::Any
            && self.effective_platforms().is_empty()
    }

    /// Wanted genres, or none at all if the user asked to be surprised
    pub fn effective_wanted_genres(&self) -> &[String] {
        if self
            .wanted_genres
            .iter()
            .any(|g| g.eq_ignore_ascii_case("surprise"))
        {
            &[]
        } else {
            &self.wanted_genres
        }
    }

    /// Platforms that actually constrain the search
    pub fn effective_platforms(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .map(String::as_str)
            .filter(|p| !p.eq_ignore_ascii_case("other"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        let answer: QuizAnswer = "mood = melancholic".parse().unwrap();

        assert_eq!(answer, QuizAnswer::new("mood", "melancholic"));
        assert_eq!(answer.to_string(), "mood: melancholic");
    }

    #[test]
    fn test_parse_answer_keeps_equals_in_free_text() {
        let answer: QuizAnswer = "wish=something where love = loss".parse().unwrap();

        assert_eq!(answer.selected_option, "something where love = loss");
    }

    #[test]
    fn test_parse_malformed_answer() {
        assert!(matches!(
            "melancholic".parse::<QuizAnswer>(),
            Err(RetrievalError::MalformedAnswer(_))
        ));
        assert!(matches!(
            "=slow".parse::<QuizAnswer>(),
            Err(RetrievalError::MalformedAnswer(_))
        ));
    }

    #[test]
    fn test_deserialize_both_shapes() {
        let answers: Vec<QuizAnswer> = serde_json::from_str(
            r#"[{"mood": "melancholic"}, {"question_id": "pace", "selected_option": "slow"}]"#,
        )
        .unwrap();

        assert_eq!(
            answers,
            vec![
                QuizAnswer::new("mood", "melancholic"),
                QuizAnswer::new("pace", "slow")
            ]
        );
    }

    #[test]
    fn test_deserialize_rejects_multi_entry_pair() {
        let result: Result<QuizAnswer, _> =
            serde_json::from_str(r#"{"mood": "calm", "pace": "slow"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_duration_preference() {
        assert!(DurationPreference::Any.accepts(None));
        assert!(DurationPreference::Short.accepts(Some(89)));
        assert!(!DurationPreference::Short.accepts(Some(90)));
        assert!(DurationPreference::Standard.accepts(Some(90)));
        assert!(DurationPreference::Standard.accepts(Some(120)));
        assert!(!DurationPreference::Long.accepts(Some(120)));
        assert!(DurationPreference::Long.accepts(Some(121)));
        assert!(!DurationPreference::Long.accepts(None));
    }

    #[test]
    fn test_parse_duration_preference() {
        assert_eq!("<90".parse::<DurationPreference>(), Ok(DurationPreference::Short));
        assert_eq!("90-120".parse::<DurationPreference>(), Ok(DurationPreference::Standard));
        assert_eq!(">120".parse::<DurationPreference>(), Ok(DurationPreference::Long));
        assert_eq!("ANY".parse::<DurationPreference>(), Ok(DurationPreference::Any));
        assert!("forever".parse::<DurationPreference>().is_err());
    }

    #[test]
    fn test_context_unconstrained() {
        let mut context = RetrievalContext::new();
        assert!(context.is_unconstrained());

        context.wanted_genres = vec!["Surprise".to_string()];
        context.platforms = vec!["other".to_string()];
        assert!(context.is_unconstrained());

        context.platforms.push("Netflix".to_string());
        assert!(!context.is_unconstrained());
    }
}
