//! Retrieval pipeline.
//!
//! Two independent read paths:
//!
//! - **Owner-scoped semantic search**: identity → query embedding →
//!   [`KnowledgeStore::similarity_search`] restricted to that identity.
//! - **Public brain**: no identity; lists any owner's items as
//!   [`PublicProjection`]s (no content, no embeddings).

use std::sync::Arc;

use tracing::info;

use crate::embedding::ensure_dims;
use crate::enrich::EnrichmentService;
use crate::error::BrainError;
use crate::models::{OwnerId, PublicProjection, ScoredItem};
use crate::store::{KnowledgeStore, SimilarityQuery};

/// Default minimum cosine similarity for a search hit.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.4;
/// Default maximum number of search hits.
pub const DEFAULT_MATCH_COUNT: usize = 10;

/// The fixed `(threshold, top_k)` cutoff applied to every search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    threshold: f32,
    top_k: usize,
}

impl MatchPolicy {
    /// Validate `threshold ∈ (0, 1]` and `top_k >= 1`.
    pub fn new(threshold: f32, top_k: usize) -> Result<Self, BrainError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(BrainError::InvalidInput(format!(
                "match_threshold must be in (0, 1], got {threshold}"
            )));
        }
        if top_k < 1 {
            return Err(BrainError::InvalidInput("match_count must be >= 1".to_string()));
        }
        Ok(Self { threshold, top_k })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            top_k: DEFAULT_MATCH_COUNT,
        }
    }
}

pub struct RetrievalPipeline {
    enricher: Arc<EnrichmentService>,
    store: Arc<dyn KnowledgeStore>,
    policy: MatchPolicy,
}

impl RetrievalPipeline {
    pub fn new(
        enricher: Arc<EnrichmentService>,
        store: Arc<dyn KnowledgeStore>,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            enricher,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Semantic search over the caller's own items.
    pub async fn search(
        &self,
        owner: Option<&OwnerId>,
        query: &str,
    ) -> Result<Vec<ScoredItem>, BrainError> {
        let owner = owner
            .ok_or_else(|| BrainError::Unauthenticated("no identity for search".to_string()))?;

        let query_embedding = self.enricher.embed_query(query).await?;
        ensure_dims(&query_embedding, self.enricher.embed_dim())?;

        let hits = self
            .store
            .similarity_search(&SimilarityQuery {
                embedding: &query_embedding,
                owner,
                threshold: self.policy.threshold,
                top_k: self.policy.top_k,
            })
            .await
            .map_err(BrainError::store_read)?;

        info!(owner = %owner, hits = hits.len(), "semantic search");
        Ok(hits)
    }

    /// Public, read-only listing of `owner`'s items.
    pub async fn public_brain(&self, owner: &OwnerId) -> Result<Vec<PublicProjection>, BrainError> {
        self.store
            .list_by_owner(owner)
            .await
            .map_err(BrainError::store_read)
    }
}
