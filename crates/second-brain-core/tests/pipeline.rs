//! End-to-end tests of the capture and retrieval pipelines against the
//! in-memory store with scripted AI providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use second_brain_core::models::NewKnowledgeItem;
use second_brain_core::provider::{Embedder, TextGenerator};
use second_brain_core::store::memory::InMemoryStore;
use second_brain_core::store::{KnowledgeStore, SimilarityQuery};
use second_brain_core::{
    BrainError, CaptureInput, CapturePipeline, EnrichmentService, KnowledgeItem, MatchPolicy,
    OwnerId, ProviderError, PublicProjection, RetrievalPipeline, ScoredItem,
};

const DIM: usize = 768;

// ─── Fakes ──────────────────────────────────────────────────────────

enum Script {
    Reply(&'static str),
    Quota,
}

struct ScriptedGenerator {
    script: Script,
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted-gen"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Reply(text) => Ok(text.to_string()),
            Script::Quota => Err(ProviderError::Unavailable(
                "429 RESOURCE_EXHAUSTED: quota exceeded".to_string(),
            )),
        }
    }
}

/// One-hot topic embedder: texts about the same topic get identical vectors.
struct TopicEmbedder {
    len: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for TopicEmbedder {
    fn model_name(&self) -> &str {
        "topic-embed"
    }

    async fn embed(&self, text: &str, _dims: usize) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = text.to_lowercase();
        let slot = if text.contains("neural") {
            0
        } else if text.contains("cooking") || text.contains("recipe") {
            1
        } else {
            2
        };
        let mut v = vec![0.0; self.len];
        v[slot] = 1.0;
        Ok(v)
    }
}

struct BrokenStore;

#[async_trait]
impl KnowledgeStore for BrokenStore {
    async fn insert(&self, _item: &NewKnowledgeItem) -> Result<KnowledgeItem> {
        anyhow::bail!("disk full")
    }
    async fn list_by_owner(&self, _owner: &OwnerId) -> Result<Vec<PublicProjection>> {
        anyhow::bail!("connection reset")
    }
    async fn similarity_search(&self, _query: &SimilarityQuery<'_>) -> Result<Vec<ScoredItem>> {
        anyhow::bail!("connection reset")
    }
}

struct Harness {
    store: Arc<InMemoryStore>,
    generator: Arc<ScriptedGenerator>,
    embedder: Arc<TopicEmbedder>,
    capture: CapturePipeline,
    retrieval: RetrievalPipeline,
}

fn harness_with(script: Script, embed_len: usize) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let generator = Arc::new(ScriptedGenerator {
        script,
        calls: AtomicUsize::new(0),
    });
    let embedder = Arc::new(TopicEmbedder {
        len: embed_len,
        calls: AtomicUsize::new(0),
    });
    let enricher = Arc::new(EnrichmentService::new(
        generator.clone(),
        embedder.clone(),
        DIM,
    ));
    Harness {
        capture: CapturePipeline::new(enricher.clone(), store.clone()),
        retrieval: RetrievalPipeline::new(enricher, store.clone(), MatchPolicy::default()),
        store,
        generator,
        embedder,
    }
}

fn harness() -> Harness {
    harness_with(
        Script::Reply("LLMs are text-trained neural networks. | AI, NLP, ML"),
        DIM,
    )
}

fn note(title: &str, content: &str, tags: &[&str]) -> CaptureInput {
    CaptureInput {
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

const LLM_NOTE: &str = "Large language models are neural networks trained on text.";

// ─── Capture ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_capture_llm_scenario() {
    let h = harness();
    let owner = OwnerId::new("user_u");

    let item = h
        .capture
        .capture(Some(&owner), note("LLMs", LLM_NOTE, &["reading", "AI"]))
        .await
        .unwrap();

    assert_eq!(item.owner_id, owner);
    assert_eq!(item.summary, "LLMs are text-trained neural networks.");
    assert_eq!(item.embedding.len(), DIM);
    for tag in ["reading", "AI", "NLP", "ML"] {
        assert!(item.tags.contains(&tag.to_string()), "missing tag {tag}");
    }
    assert_eq!(item.tags.len(), 4, "AI must appear once: {:?}", item.tags);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_capture_tags_superset_without_duplicates() {
    let h = harness();
    let owner = OwnerId::new("u");
    let user_tags = ["ML", "ml", "papers", "ML"];

    let item = h
        .capture
        .capture(Some(&owner), note("t", LLM_NOTE, &user_tags))
        .await
        .unwrap();

    for tag in user_tags {
        assert!(item.tags.iter().any(|t| t == tag));
    }
    let mut deduped = item.tags.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), item.tags.len());
}

#[tokio::test]
async fn test_capture_is_append_only() {
    let h = harness();
    let owner = OwnerId::new("u");

    let a = h
        .capture
        .capture(Some(&owner), note("same", LLM_NOTE, &[]))
        .await
        .unwrap();
    let b = h
        .capture
        .capture(Some(&owner), note("same", LLM_NOTE, &[]))
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn test_capture_quota_exceeded_persists_nothing() {
    let h = harness_with(Script::Quota, DIM);
    let owner = OwnerId::new("u");

    let err = h
        .capture
        .capture(Some(&owner), note("t", LLM_NOTE, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, BrainError::ProviderUnavailable(_)));
    assert!(err.is_retryable());
    assert!(h.store.is_empty());
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_capture_wrong_dimension_persists_nothing() {
    let h = harness_with(Script::Reply("S | a, b, c"), 512);
    let owner = OwnerId::new("u");

    let err = h
        .capture
        .capture(Some(&owner), note("t", LLM_NOTE, &[]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BrainError::EmbeddingDimensionMismatch {
            expected: 768,
            actual: 512
        }
    ));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_capture_without_identity_is_unauthenticated() {
    let h = harness();
    let err = h
        .capture
        .capture(None, note("t", LLM_NOTE, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, BrainError::Unauthenticated(_)));
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_capture_blank_content_rejected() {
    let h = harness();
    let owner = OwnerId::new("u");
    let err = h
        .capture
        .capture(Some(&owner), note("t", "   ", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, BrainError::InvalidInput(_)));
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_capture_without_delimiter_keeps_user_tags() {
    let h = harness_with(Script::Reply("A summary the model forgot to tag."), DIM);
    let owner = OwnerId::new("u");

    let item = h
        .capture
        .capture(Some(&owner), note("t", LLM_NOTE, &["mine"]))
        .await
        .unwrap();

    assert_eq!(item.summary, "A summary the model forgot to tag.");
    assert_eq!(item.tags, vec!["mine".to_string()]);
}

#[tokio::test]
async fn test_store_failure_is_store_write_error() {
    let generator = Arc::new(ScriptedGenerator {
        script: Script::Reply("S | a"),
        calls: AtomicUsize::new(0),
    });
    let embedder = Arc::new(TopicEmbedder {
        len: DIM,
        calls: AtomicUsize::new(0),
    });
    let enricher = Arc::new(EnrichmentService::new(generator, embedder, DIM));
    let store: Arc<dyn KnowledgeStore> = Arc::new(BrokenStore);
    let capture = CapturePipeline::new(enricher.clone(), store.clone());
    let retrieval = RetrievalPipeline::new(enricher, store, MatchPolicy::default());
    let owner = OwnerId::new("u");

    let err = capture
        .capture(Some(&owner), note("t", LLM_NOTE, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, BrainError::StoreWrite(ref m) if m.contains("disk full")));

    let err = retrieval.public_brain(&owner).await.unwrap_err();
    assert!(matches!(err, BrainError::StoreRead(_)));
}

// ─── Retrieval ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_never_leaks_other_owners() {
    let h = harness();
    let u = OwnerId::new("user_u");
    let v = OwnerId::new("user_v");

    h.capture
        .capture(Some(&u), note("u-llm", LLM_NOTE, &[]))
        .await
        .unwrap();
    h.capture
        .capture(Some(&v), note("v-llm", "Neural networks power modern NLP.", &[]))
        .await
        .unwrap();

    let hits = h.retrieval.search(Some(&u), "neural networks").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "u-llm");
    assert!(hits.iter().all(|hit| hit.owner_id == u));

    let hits = h.retrieval.search(Some(&v), "neural networks").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "v-llm");
}

#[tokio::test]
async fn test_search_applies_threshold() {
    let h = harness();
    let u = OwnerId::new("u");

    h.capture
        .capture(Some(&u), note("llm", LLM_NOTE, &[]))
        .await
        .unwrap();
    h.capture
        .capture(Some(&u), note("soup", "A cooking recipe for tomato soup.", &[]))
        .await
        .unwrap();

    let hits = h.retrieval.search(Some(&u), "neural networks").await.unwrap();
    let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["llm"]);
    assert!(hits[0].similarity >= h.retrieval.policy().threshold());
}

#[tokio::test]
async fn test_search_respects_top_k() {
    let store = Arc::new(InMemoryStore::new());
    let enricher = Arc::new(EnrichmentService::new(
        Arc::new(ScriptedGenerator {
            script: Script::Reply("S | a"),
            calls: AtomicUsize::new(0),
        }),
        Arc::new(TopicEmbedder {
            len: DIM,
            calls: AtomicUsize::new(0),
        }),
        DIM,
    ));
    let capture = CapturePipeline::new(enricher.clone(), store.clone());
    let retrieval =
        RetrievalPipeline::new(enricher, store, MatchPolicy::new(0.5, 2).unwrap());
    let u = OwnerId::new("u");

    for i in 0..5 {
        capture
            .capture(Some(&u), note(&format!("n{i}"), LLM_NOTE, &[]))
            .await
            .unwrap();
    }

    let hits = retrieval.search(Some(&u), "neural").await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn test_search_uses_embedding_only() {
    let h = harness();
    let u = OwnerId::new("u");

    let hits = h.retrieval.search(Some(&u), "neural networks").await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_search_requires_identity_and_query() {
    let h = harness();
    assert!(matches!(
        h.retrieval.search(None, "neural").await,
        Err(BrainError::Unauthenticated(_))
    ));
    let u = OwnerId::new("u");
    assert!(matches!(
        h.retrieval.search(Some(&u), " ").await,
        Err(BrainError::InvalidInput(_))
    ));
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_wrong_query_dimension() {
    let h = harness_with(Script::Reply("S | a"), 512);
    let u = OwnerId::new("u");
    assert!(matches!(
        h.retrieval.search(Some(&u), "neural").await,
        Err(BrainError::EmbeddingDimensionMismatch { .. })
    ));
}

#[tokio::test]
async fn test_public_brain_projection() {
    let h = harness();
    let u = OwnerId::new("u");
    let v = OwnerId::new("v");

    h.capture
        .capture(Some(&u), note("first", LLM_NOTE, &["x"]))
        .await
        .unwrap();
    h.capture
        .capture(Some(&v), note("other", LLM_NOTE, &[]))
        .await
        .unwrap();
    h.capture
        .capture(Some(&u), note("second", LLM_NOTE, &[]))
        .await
        .unwrap();

    let listed = h.retrieval.public_brain(&u).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "first"]);

    let json = serde_json::to_value(&listed).unwrap();
    for entry in json.as_array().unwrap() {
        let obj = entry.as_object().unwrap();
        assert!(!obj.contains_key("content"));
        assert!(!obj.contains_key("embedding"));
        assert!(obj.contains_key("summary"));
        assert!(obj.contains_key("created_at"));
    }
}

#[tokio::test]
async fn test_public_brain_unknown_owner_is_empty() {
    let h = harness();
    let listed = h.retrieval.public_brain(&OwnerId::new("nobody")).await.unwrap();
    assert!(listed.is_empty());
}
