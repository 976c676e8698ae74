//! Prompt construction and model response validation.
//!
//! The model is untrusted: whatever it answers is parsed leniently and then
//! checked against the candidate set it was shown.

use catalog::{Candidate, MovieId};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

const SYNOPSIS_CHARS: usize = 200;

/// The model's validated pick
#[derive(Debug, Clone, PartialEq)]
pub struct ModelChoice {
    pub movie_id: MovieId,
    pub reasoning: String,
    /// Secondary picks that name real candidates, deduplicated, in model order
    pub secondary: Vec<SecondaryPick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryPick {
    pub movie_id: MovieId,
    pub tagline: Option<String>,
}

/// Why a model response was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("response has no primary pick")]
    MissingPrimary,

    #[error("film_id {0} is not one of the candidates")]
    UnknownFilm(String),

    #[error("primary pick has no reasoning")]
    BlankReasoning,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    primary: Option<Value>,
    #[serde(default)]
    secondary: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    film_id: Value,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
}

/// Build the prompt asking the model to choose among `candidates`
pub fn build_prompt(mood_text: &str, candidates: &[Candidate], alternatives: usize) -> String {
    let films = candidates
        .iter()
        .map(candidate_line)
        .collect::<Vec<_>>()
        .join("\n");

    let mood = if mood_text.trim().is_empty() {
        "(no answers given)"
    } else {
        mood_text
    };
    let secondary_count = alternatives.min(candidates.len().saturating_sub(1));

    format!(
        "You are a film recommendation expert. Recommend THE one film that best fits \
the user's current mood and preferences.

## USER PROFILE (quiz answers, in order)

{mood}

## CANDIDATE FILMS (by semantic relevance)

{films}

## INSTRUCTIONS

Choose ONLY from the candidate films above and use their exact ID.
1. One primary film with personalised reasoning (2-3 sentences on WHY it fits the user's state)
2. Up to {secondary_count} secondary films, each with a one-sentence tagline

Reply ONLY with this JSON (no text before or after):
{{
  \"primary\": {{\"film_id\": <id>, \"title\": \"<title>\", \"reasoning\": \"<2-3 sentences>\"}},
  \"secondary\": [
    {{\"film_id\": <id>, \"title\": \"<title>\", \"tagline\": \"<one sentence>\"}}
  ]
}}"
    )
}

/// Appended to the prompt after a rejected response
pub fn corrective_note(rejection: &Rejection) -> String {
    format!(
        "\n\nYOUR PREVIOUS ANSWER WAS REJECTED ({rejection}). Reply with the JSON object only, \
and use a film_id from the candidate list."
    )
}

fn candidate_line(candidate: &Candidate) -> String {
    let movie = &candidate.movie;
    let year = movie
        .year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let genres = if movie.genres.is_empty() {
        "N/A".to_string()
    } else {
        movie.genres.join(", ")
    };
    let rating = movie
        .vote_average
        .map(|r| format!("{r:.1}/10"))
        .unwrap_or_else(|| "N/A".to_string());
    let synopsis = movie
        .overview
        .as_deref()
        .map(truncate_synopsis)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "- ID:{} | {} ({}) | Genres: {} | Rating: {} | Synopsis: {}",
        movie.id, movie.title, year, genres, rating, synopsis
    )
}

fn truncate_synopsis(overview: &str) -> String {
    if overview.chars().count() <= SYNOPSIS_CHARS {
        return overview.to_string();
    }
    let cut: String = overview.chars().take(SYNOPSIS_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Parse and validate a model response against the candidates it was shown
pub fn parse_response(raw: &str, candidates: &[Candidate]) -> Result<ModelChoice, Rejection> {
    let allowed: HashSet<MovieId> = candidates.iter().map(Candidate::movie_id).collect();
    let response = decode(raw)?;

    let primary = response.primary.ok_or(Rejection::MissingPrimary)?;
    let primary: RawPick =
        serde_json::from_value(primary).map_err(|e| Rejection::NotJson(e.to_string()))?;

    let movie_id = film_id(&primary.film_id)
        .filter(|id| allowed.contains(id))
        .ok_or_else(|| Rejection::UnknownFilm(primary.film_id.to_string()))?;

    let reasoning = primary
        .reasoning
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(Rejection::BlankReasoning)?
        .to_string();

    let mut used = HashSet::from([movie_id]);
    let secondary = response
        .secondary
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawPick>(value).ok())
        .filter_map(|pick| {
            let id = film_id(&pick.film_id).filter(|id| allowed.contains(id))?;
            used.insert(id).then(|| SecondaryPick {
                movie_id: id,
                tagline: pick
                    .tagline
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            })
        })
        .collect();

    Ok(ModelChoice {
        movie_id,
        reasoning,
        secondary,
    })
}

/// Decode the JSON object, tolerating markdown fences and surrounding prose
fn decode(raw: &str) -> Result<RawResponse, Rejection> {
    let cleaned = strip_code_fence(raw);
    match serde_json::from_str(cleaned) {
        Ok(response) => Ok(response),
        Err(err) => {
            let start = cleaned.find('{');
            let end = cleaned.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&cleaned[start..=end])
                        .map_err(|e| Rejection::NotJson(e.to_string()))
                }
                _ => Err(Rejection::NotJson(err.to_string())),
            }
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split("```").next().unwrap_or(rest);
    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim()
}

/// Models send ids as numbers or numeric strings
fn film_id(value: &Value) -> Option<MovieId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|id| MovieId::try_from(id).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
