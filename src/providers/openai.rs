//! OpenAI-compatible REST adapter (`/chat/completions`, `/embeddings`).

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use second_brain_core::error::ProviderError;
use second_brain_core::provider::{Embedder, TextGenerator};

use super::{http_client, send_json};
use crate::config::AiConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    generation_model: String,
    embedding_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
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
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.generation_model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!(model = %self.generation_model, "openai chat completion");
        let body = ChatRequest {
            model: &self.generation_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: ChatResponse = send_json(request, "chat/completions").await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Malformed("chat/completions returned no content".to_string())
            })
    }
}

#[async_trait]
impl Embedder for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str, dims: usize) -> Result<Vec<f32>, ProviderError> {
        debug!(model = %self.embedding_model, dims, "openai embeddings");
        let body = EmbeddingsRequest {
            model: &self.embedding_model,
            input: text,
            dimensions: dims,
        };

        let request = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: EmbeddingsResponse = send_json(request, "embeddings").await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Malformed("embeddings returned no data".to_string()))
    }
}
