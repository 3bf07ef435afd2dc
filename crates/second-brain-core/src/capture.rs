//! Capture pipeline: identity → enrichment → tag merge → store.
//!
//! Stateless and single-pass. Captures are append-only: capturing the
//! same note twice yields two distinct items.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::embedding::ensure_dims;
use crate::enrich::EnrichmentService;
use crate::error::BrainError;
use crate::models::{CaptureInput, KnowledgeItem, NewKnowledgeItem, OwnerId};
use crate::store::KnowledgeStore;

/// Union user tags with generated tags.
///
/// Tags are whitespace-trimmed, blank tags are dropped, and duplicates
/// are collapsed by exact (case-sensitive) match. User tags come first.
pub fn merge_tags(user: &[String], auto: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    user.iter()
        .chain(auto.iter())
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

pub struct CapturePipeline {
    enricher: Arc<EnrichmentService>,
    store: Arc<dyn KnowledgeStore>,
}

impl CapturePipeline {
    pub fn new(enricher: Arc<EnrichmentService>, store: Arc<dyn KnowledgeStore>) -> Self {
        Self { enricher, store }
    }

    /// Enrich and persist a note for `owner`.
    ///
    /// `owner` is the resolved identity; `None` fails with
    /// [`BrainError::Unauthenticated`] before any provider call.
    pub async fn capture(
        &self,
        owner: Option<&OwnerId>,
        input: CaptureInput,
    ) -> Result<KnowledgeItem, BrainError> {
        let owner = owner
            .ok_or_else(|| BrainError::Unauthenticated("no identity for capture".to_string()))?;

        let enrichment = self.enricher.enrich(&input.content).await?;

        // Checked again here so a misbehaving enricher can never reach the store.
        ensure_dims(&enrichment.embedding, self.enricher.embed_dim())?;

        let tags = merge_tags(&input.tags, &enrichment.tags);

        let item = NewKnowledgeItem {
            owner_id: owner.clone(),
            title: input.title,
            content: input.content,
            summary: enrichment.summary,
            tags,
            embedding: enrichment.embedding,
        };

        let stored = self
            .store
            .insert(&item)
            .await
            .map_err(BrainError::store_write)?;

        info!(
            owner = %stored.owner_id,
            id = %stored.id,
            tags = stored.tags.len(),
            "captured knowledge item"
        );
        Ok(stored)
    }
}
