//! Remote sentence-transformer encoder backed by the Hugging Face
//! inference API.

use crate::error::{EncoderError, Result};
use crate::{DEFAULT_DIMENSION, Encoder, is_blank, zero_vector};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co/models";
const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HuggingFaceEncoder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EncodeRequest<'a> {
    inputs: &'a [String],
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    wait_for_model: bool,
    use_cache: bool,
}

/// The API answers a list input with a list of vectors, but some
/// deployments unwrap single-element batches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EncodeResponse {
    Batch(Vec<Vec<f32>>),
    Single(Vec<f32>),
}

impl HuggingFaceEncoder {
    /// Encoder for all-MiniLM-L6-v2 (384 dimensions)
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: HUGGINGFACE_API_BASE.to_string(),
            model: MODEL_NAME.to_string(),
            dimension: DEFAULT_DIMENSION,
        })
    }

    /// Use another sentence-transformer model with its output dimension
    pub fn with_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.model = model.into();
        self.dimension = dimension;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EncodeRequest {
            inputs: texts,
            options: Options {
                wait_for_model: true,
                use_cache: true,
            },
        };

        debug!(count = texts.len(), model = %self.model, "Sending embedding request");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("HuggingFace API error {}: {}", status, body);
            return Err(EncoderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_embeddings(&body, texts.len(), self.dimension)
    }
}

#[async_trait]
impl Encoder for HuggingFaceEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        if is_blank(text) {
            return Ok(zero_vector(self.dimension));
        }
        let mut embeddings = self.request_embeddings(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EncoderError::InvalidResponse("no embedding returned".to_string()))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Blank texts never reach the API; they get zero vectors in place.
        let non_blank: Vec<String> = texts.iter().filter(|t| !is_blank(t)).cloned().collect();
        let encoded = if non_blank.is_empty() {
            Vec::new()
        } else {
            self.request_embeddings(&non_blank).await?
        };
        let mut encoded = encoded.into_iter();

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            if is_blank(text) {
                embeddings.push(zero_vector(self.dimension));
            } else {
                let embedding = encoded.next().ok_or_else(|| {
                    EncoderError::InvalidResponse("fewer embeddings than inputs".to_string())
                })?;
                embeddings.push(embedding);
            }
        }
        Ok(embeddings)
    }
}

/// Decode an API response body, checking count and dimension
pub fn parse_embeddings(
    body: &str,
    expected_count: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    let parsed: EncodeResponse = serde_json::from_str(body)
        .map_err(|e| EncoderError::InvalidResponse(format!("{e}: {}", truncate(body, 200))))?;

    let embeddings = match parsed {
        EncodeResponse::Batch(batch) => batch,
        EncodeResponse::Single(vector) => vec![vector],
    };

    if embeddings.len() != expected_count {
        return Err(EncoderError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected_count,
            embeddings.len()
        )));
    }
    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
        return Err(EncoderError::DimensionMismatch {
            expected: dimension,
            found: bad.len(),
        });
    }
    Ok(embeddings)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
