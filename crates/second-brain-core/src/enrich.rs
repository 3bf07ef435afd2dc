//! Content enrichment service.
//!
//! Turns raw note text into a one-sentence summary, a small set of
//! auto-generated tags, and a fixed-dimension embedding vector.
//!
//! # Flow
//!
//! 1. Reject empty or whitespace-only text.
//! 2. Ask the [`TextGenerator`] for `Summary | Tag1, Tag2, Tag3`.
//! 3. Parse the response with [`parse_generation`], which never fails.
//! 4. Ask the [`Embedder`] for an `embed_dim`-length vector of the same text.
//! 5. Reject the vector if its length is not `embed_dim`.
//!
//! The two provider calls are sequential and both must succeed; no partial
//! enrichment is ever returned.

use std::sync::Arc;

use tracing::debug;

use crate::embedding::ensure_dims;
use crate::error::BrainError;
use crate::provider::{Embedder, TextGenerator};

/// Number of tags requested from (and accepted out of) the generator.
pub const AUTO_TAG_COUNT: usize = 3;

/// Separator between the summary and the tag list in the model output.
pub const SUMMARY_DELIMITER: char = '|';

/// Build the fixed generation prompt for `text`.
pub fn build_prompt(text: &str) -> String {
    format!(
        "Summarize this in one sentence and provide {AUTO_TAG_COUNT} relevant tags.\n\
         Format: Summary {SUMMARY_DELIMITER} Tag1, Tag2, Tag3\n\n\
         Content: {text}"
    )
}

/// Result of parsing a generation response.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    /// The delimiter was present.
    Delimited { summary: String, tags: Vec<String> },
    /// No delimiter: the whole response is the summary.
    Unstructured { summary: String },
}

impl GenerationOutput {
    pub fn into_parts(self) -> (String, Vec<String>) {
        match self {
            GenerationOutput::Delimited { summary, tags } => (summary, tags),
            GenerationOutput::Unstructured { summary } => (summary, Vec::new()),
        }
    }
}

/// Parse `Summary | Tag1, Tag2, Tag3` out of an untrusted model response.
///
/// The tag section ends at the next delimiter if the model emitted more
/// than one. Blank tags are dropped and at most [`AUTO_TAG_COUNT`] are kept.
pub fn parse_generation(raw: &str) -> GenerationOutput {
    match raw.split_once(SUMMARY_DELIMITER) {
        Some((summary, rest)) => {
            let tag_section = rest.split(SUMMARY_DELIMITER).next().unwrap_or_default();
            let tags = tag_section
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .take(AUTO_TAG_COUNT)
                .map(str::to_string)
                .collect();
            GenerationOutput::Delimited {
                summary: summary.trim().to_string(),
                tags,
            }
        }
        None => GenerationOutput::Unstructured {
            summary: raw.trim().to_string(),
        },
    }
}

/// Everything the AI step contributes to a knowledge item.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub summary: String,
    pub tags: Vec<String>,
    pub embedding: Vec<f32>,
}

/// Wraps the AI providers and normalizes their failure modes.
pub struct EnrichmentService {
    generator: Arc<dyn TextGenerator>,
    embedder: Arc<dyn Embedder>,
    embed_dim: usize,
}

impl EnrichmentService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
        embed_dim: usize,
    ) -> Self {
        Self {
            generator,
            embedder,
            embed_dim,
        }
    }

    /// The process-wide embedding dimension every vector must match.
    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    /// Summarize, tag, and embed `text`.
    pub async fn enrich(&self, text: &str) -> Result<Enrichment, BrainError> {
        require_text(text, "content")?;

        debug!(model = self.generator.model_name(), "generating summary and tags");
        let raw = self.generator.generate(&build_prompt(text)).await?;
        let (summary, tags) = parse_generation(&raw).into_parts();

        let embedding = self.embed_checked(text).await?;

        Ok(Enrichment {
            summary,
            tags,
            embedding,
        })
    }

    /// Embed a search query. No generation call is made.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, BrainError> {
        require_text(query, "query")?;
        self.embed_checked(query).await
    }

    async fn embed_checked(&self, text: &str) -> Result<Vec<f32>, BrainError> {
        debug!(
            model = self.embedder.model_name(),
            dims = self.embed_dim,
            "requesting embedding"
        );
        let embedding = self.embedder.embed(text, self.embed_dim).await?;
        ensure_dims(&embedding, self.embed_dim)?;
        Ok(embedding)
    }
}

fn require_text(text: &str, field: &str) -> Result<(), BrainError> {
    if text.trim().is_empty() {
        return Err(BrainError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        fn model_name(&self) -> &str {
            "fixed"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        fn model_name(&self) -> &str {
            "failing"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("429 RESOURCE_EXHAUSTED".into()))
        }
    }

    struct CountingEmbedder {
        len: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }
        async fn embed(&self, _text: &str, _dims: usize) -> Result<Vec<f32>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.5; self.len])
        }
    }

    fn embedder(len: usize) -> Arc<CountingEmbedder> {
        Arc::new(CountingEmbedder {
            len,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_prompt_format() {
        let prompt = build_prompt("hello world");
        assert!(prompt.starts_with("Summarize this in one sentence and provide 3 relevant tags."));
        assert!(prompt.contains("Format: Summary | Tag1, Tag2, Tag3"));
        assert!(prompt.ends_with("Content: hello world"));
    }

    #[test]
    fn test_parse_well_formed() {
        let out = parse_generation("LLMs are text-trained neural networks. | AI, NLP, ML");
        assert_eq!(
            out,
            GenerationOutput::Delimited {
                summary: "LLMs are text-trained neural networks.".into(),
                tags: vec!["AI".into(), "NLP".into(), "ML".into()],
            }
        );
    }

    #[test]
    fn test_parse_missing_delimiter_falls_back_to_summary() {
        let out = parse_generation("  Just a sentence with no tags.\n");
        assert_eq!(
            out,
            GenerationOutput::Unstructured {
                summary: "Just a sentence with no tags.".into()
            }
        );
        assert!(out.into_parts().1.is_empty());
    }

    #[test]
    fn test_parse_empty_tag_section() {
        let (summary, tags) = parse_generation("Summary only |   ").into_parts();
        assert_eq!(summary, "Summary only");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_extra_delimiters_and_tags() {
        let (summary, tags) =
            parse_generation("S. | a, , b, c, d | trailing noise").into_parts();
        assert_eq!(summary, "S.");
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_empty_response() {
        let (summary, tags) = parse_generation("").into_parts();
        assert_eq!(summary, "");
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_enrich_success() {
        let emb = embedder(8);
        let service = EnrichmentService::new(
            Arc::new(FixedGenerator("Short. | x, y, z")),
            emb.clone(),
            8,
        );
        let e = service.enrich("some text").await.unwrap();
        assert_eq!(e.summary, "Short.");
        assert_eq!(e.tags, vec!["x", "y", "z"]);
        assert_eq!(e.embedding.len(), 8);
        assert_eq!(emb.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_enrich_rejects_wrong_dimension() {
        let service =
            EnrichmentService::new(Arc::new(FixedGenerator("S | a")), embedder(512), 768);
        let err = service.enrich("text").await.unwrap_err();
        assert!(matches!(
            err,
            BrainError::EmbeddingDimensionMismatch {
                expected: 768,
                actual: 512
            }
        ));
    }

    #[tokio::test]
    async fn test_generation_failure_skips_embedding() {
        let emb = embedder(8);
        let service = EnrichmentService::new(Arc::new(FailingGenerator), emb.clone(), 8);
        let err = service.enrich("text").await.unwrap_err();
        assert!(matches!(err, BrainError::ProviderUnavailable(_)));
        assert_eq!(emb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_text_rejected_before_provider_calls() {
        let emb = embedder(8);
        let service = EnrichmentService::new(Arc::new(FailingGenerator), emb.clone(), 8);
        assert!(matches!(
            service.enrich("  \n\t").await,
            Err(BrainError::InvalidInput(_))
        ));
        assert!(matches!(
            service.embed_query("").await,
            Err(BrainError::InvalidInput(_))
        ));
        assert_eq!(emb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embed_query_does_not_generate() {
        // A failing generator proves embed_query never calls it.
        let service = EnrichmentService::new(Arc::new(FailingGenerator), embedder(4), 4);
        let v = service.embed_query("neural networks").await.unwrap();
        assert_eq!(v.len(), 4);
    }
}
