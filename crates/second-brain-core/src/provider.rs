//! AI provider traits.
//!
//! The enrichment service talks to the generative model and the
//! embedding model only through these traits. Concrete adapters (Gemini,
//! OpenAI-compatible) live in the application crate; tests substitute
//! scripted fakes.
//!
//! Implementations must not retry: a failed call is reported as
//! [`ProviderError::Unavailable`] and fails the whole request.

use async_trait::async_trait;

use crate::error::ProviderError;

/// A text generation model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.5-flash"`).
    fn model_name(&self) -> &str;

    /// Send a single prompt and return the model's text response.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// An embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-embedding-001"`).
    fn model_name(&self) -> &str;

    /// Embed `text`, requesting a vector of `dims` components.
    ///
    /// The returned length is whatever the provider produced; callers
    /// validate it.
    async fn embed(&self, text: &str, dims: usize) -> Result<Vec<f32>, ProviderError>;
}
