//! Google Gemini REST adapter.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use second_brain_core::error::ProviderError;
use second_brain_core::provider::{Embedder, TextGenerator};

use super::{http_client, send_json};
use crate::config::AiConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    generation_model: String,
    embedding_model: String,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiProvider {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            http: http_client(config.timeout_secs)?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            generation_model: config.generation_model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.generation_model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!(model = %self.generation_model, "gemini generateContent");
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let request = self
            .http
            .post(self.endpoint(&self.generation_model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response: GenerateContentResponse = send_json(request, "generateContent").await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::Malformed(
                "generateContent returned no text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl Embedder for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str, dims: usize) -> Result<Vec<f32>, ProviderError> {
        debug!(model = %self.embedding_model, dims, "gemini embedContent");
        let body = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                parts: vec![Part { text }],
            },
            output_dimensionality: dims,
        };

        let request = self
            .http
            .post(self.endpoint(&self.embedding_model, "embedContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response: EmbedContentResponse = send_json(request, "embedContent").await?;
        Ok(response.embedding.values)
    }
}
