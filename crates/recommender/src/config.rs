//! Runtime configuration, read from `CINEMOOD_*` environment variables.

use crate::error::{RecommendError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "CINEMOOD_";

/// Which encoder embeds mood profiles (and the catalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    #[default]
    Hashing,
    HuggingFace,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// JSON-lines movie catalog with precomputed embeddings
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// K: how many candidates the model chooses from
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,

    /// Extra model calls allowed after an invalid response
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,

    /// Secondary picks returned alongside the recommendation
    #[serde(default = "default_alternatives_count")]
    pub alternatives_count: usize,

    /// Skip the generative model entirely
    #[serde(default)]
    pub llm_mock_mode: bool,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_requests_per_minute")]
    pub gemini_requests_per_minute: usize,

    #[serde(default)]
    pub encoder: EncoderKind,

    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    #[serde(default)]
    pub huggingface_api_key: Option<String>,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/catalog.jsonl")
}

fn default_candidate_count() -> usize {
    5
}

fn default_max_retries() -> u32 {
    1
}

fn default_llm_timeout_ms() -> u64 {
    10_000
}

fn default_alternatives_count() -> usize {
    4
}

fn default_gemini_model() -> String {
    llm_client::gemini::DEFAULT_MODEL.to_string()
}

fn default_gemini_requests_per_minute() -> usize {
    60
}

fn default_embedding_dim() -> usize {
    embeddings::DEFAULT_DIMENSION
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            candidate_count: default_candidate_count(),
            max_retries: default_max_retries(),
            llm_timeout_ms: default_llm_timeout_ms(),
            alternatives_count: default_alternatives_count(),
            llm_mock_mode: false,
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_requests_per_minute: default_gemini_requests_per_minute(),
            encoder: EncoderKind::default(),
            embedding_dim: default_embedding_dim(),
            huggingface_api_key: None,
        }
    }
}

impl RecommenderConfig {
    /// Load from the environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from explicit `(name, value)` pairs; names carry the prefix
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(|e| RecommendError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.candidate_count == 0 {
            return Err(RecommendError::Configuration(
                "candidate_count must be at least 1".to_string(),
            ));
        }
        if self.embedding_dim == 0 {
            return Err(RecommendError::Configuration(
                "embedding_dim must be positive".to_string(),
            ));
        }
        if self.encoder == EncoderKind::HuggingFace && self.huggingface_api_key().is_none() {
            return Err(RecommendError::Configuration(
                "the huggingface encoder needs CINEMOOD_HUGGINGFACE_API_KEY".to_string(),
            ));
        }
        if self.encoder == EncoderKind::HuggingFace
            && self.embedding_dim != embeddings::DEFAULT_DIMENSION
        {
            return Err(RecommendError::Configuration(format!(
                "the huggingface encoder produces {}-dimensional vectors, not {}",
                embeddings::DEFAULT_DIMENSION,
                self.embedding_dim
            )));
        }
        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    /// The Gemini key, unless mock mode is on or the key is blank
    pub fn gemini_api_key(&self) -> Option<&str> {
        if self.llm_mock_mode {
            return None;
        }
        non_blank(self.gemini_api_key.as_deref())
    }

    pub fn huggingface_api_key(&self) -> Option<&str> {
        non_blank(self.huggingface_api_key.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
