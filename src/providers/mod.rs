//! AI provider adapters.
//!
//! Concrete [`TextGenerator`] and [`Embedder`] implementations backed by
//! HTTP APIs:
//!
//! - **[`GeminiProvider`]** — Google Gemini `generateContent` / `embedContent`.
//! - **[`OpenAiProvider`]** — any OpenAI-compatible `/chat/completions` +
//!   `/embeddings` endpoint.
//!
//! Use [`create_providers`] to build the pair selected by `[ai]`.
//!
//! # Failure mapping
//!
//! Adapters never retry. A transport error, a timeout, or any non-2xx
//! status (429 quota exhaustion included) becomes
//! [`ProviderError::Unavailable`]; a 2xx body that cannot be decoded
//! becomes [`ProviderError::Malformed`].

mod gemini;
mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use second_brain_core::error::ProviderError;
use second_brain_core::provider::{Embedder, TextGenerator};

use crate::config::AiConfig;

/// Generator and embedder selected by configuration.
pub type ProviderPair = (Arc<dyn TextGenerator>, Arc<dyn Embedder>);

/// Build the provider pair named by `ai.provider`.
///
/// Fails fast if the API key environment variable is unset or empty.
pub fn create_providers(config: &AiConfig) -> Result<ProviderPair> {
    let api_key = read_api_key(config)?;
    match config.provider.as_str() {
        "gemini" => {
            let provider = Arc::new(GeminiProvider::new(config, api_key)?);
            Ok((provider.clone(), provider))
        }
        "openai" => {
            let provider = Arc::new(OpenAiProvider::new(config, api_key)?);
            Ok((provider.clone(), provider))
        }
        other => bail!("Unknown AI provider: {}", other),
    }
}

fn read_api_key(config: &AiConfig) -> Result<String> {
    let var = config.api_key_var();
    match std::env::var(&var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("{} environment variable not set", var),
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a prepared request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    api: &str,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Unavailable(format!("{api} request failed: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Unavailable(format!("{api} response read failed: {e}")))?;

    if !status.is_success() {
        return Err(ProviderError::Unavailable(format!(
            "{api} returned {status}: {}",
            truncate(&body, 300)
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::Malformed(format!("{api} response: {e}")))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
