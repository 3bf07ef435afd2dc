//! In-memory [`KnowledgeStore`] implementation for testing and embedding.
//!
//! Uses a `Vec` behind `std::sync::RwLock` for thread safety. Similarity
//! search is brute-force cosine similarity over the owner's items only.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::models::{KnowledgeItem, NewKnowledgeItem, OwnerId, PublicProjection, ScoredItem};

use super::{rank_candidates, KnowledgeStore, SimilarityQuery};

/// In-memory store; items are kept in insertion order.
pub struct InMemoryStore {
    items: RwLock<Vec<KnowledgeItem>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Total number of stored items across all owners.
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored item, for assertions in tests.
    pub fn all(&self) -> Vec<KnowledgeItem> {
        self.items
            .read()
            .map(|items| items.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn insert(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem> {
        let stored = KnowledgeItem {
            id: Uuid::new_v4().to_string(),
            owner_id: item.owner_id.clone(),
            title: item.title.clone(),
            content: item.content.clone(),
            summary: item.summary.clone(),
            tags: item.tags.clone(),
            embedding: item.embedding.clone(),
            created_at: Utc::now(),
        };
        let mut items = self
            .items
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        items.push(stored.clone());
        Ok(stored)
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<PublicProjection>> {
        let items = self
            .items
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        // Reverse insertion order is newest first.
        Ok(items
            .iter()
            .rev()
            .filter(|item| &item.owner_id == owner)
            .map(PublicProjection::from)
            .collect())
    }

    async fn similarity_search(&self, query: &SimilarityQuery<'_>) -> Result<Vec<ScoredItem>> {
        let items = self
            .items
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let candidates: Vec<ScoredItem> = items
            .iter()
            .filter(|item| &item.owner_id == query.owner)
            .map(|item| ScoredItem {
                id: item.id.clone(),
                owner_id: item.owner_id.clone(),
                title: item.title.clone(),
                content: item.content.clone(),
                summary: item.summary.clone(),
                tags: item.tags.clone(),
                created_at: item.created_at,
                similarity: cosine_similarity(query.embedding, &item.embedding),
            })
            .collect();
        Ok(rank_candidates(candidates, query.threshold, query.top_k))
    }
}
