//! Storage abstraction for knowledge items.
//!
//! The [`KnowledgeStore`] trait defines the three operations the capture
//! and retrieval pipelines depend on, enabling pluggable backends
//! (SQLite in the application crate, in-memory here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Owner scoping
//!
//! [`SimilarityQuery`] carries the owner as a required field. Backends
//! must restrict candidates to that owner *before* ranking, inside the
//! query itself. Fetching a global top-k and filtering afterwards would
//! both drop the owner's own relevant results and risk exposing other
//! owners' content.

pub mod memory;

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{KnowledgeItem, NewKnowledgeItem, OwnerId, PublicProjection, ScoredItem};

/// Parameters for an owner-scoped nearest-neighbour search.
#[derive(Debug, Clone)]
pub struct SimilarityQuery<'a> {
    /// Query vector, already validated against the configured dimension.
    pub embedding: &'a [f32],
    /// Only items owned by this identity are candidates.
    pub owner: &'a OwnerId,
    /// Minimum cosine similarity for inclusion.
    pub threshold: f32,
    /// Maximum number of results.
    pub top_k: usize,
}

/// Abstract storage backend for knowledge items.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](KnowledgeStore::insert) | Persist a fully enriched item |
/// | [`list_by_owner`](KnowledgeStore::list_by_owner) | Public projection of an owner's items |
/// | [`similarity_search`](KnowledgeStore::similarity_search) | Owner-scoped semantic search |
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Persist an item, assigning its id and creation timestamp.
    ///
    /// Either the whole item is written or nothing is.
    async fn insert(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem>;

    /// List an owner's items, newest first, without content or embeddings.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<PublicProjection>>;

    /// Return at most `top_k` of the owner's items with similarity
    /// `>= threshold`, ranked by similarity descending.
    async fn similarity_search(&self, query: &SimilarityQuery<'_>) -> Result<Vec<ScoredItem>>;
}

/// Apply the threshold, rank, and truncate scored candidates.
///
/// Ties on similarity are broken by newest first, then by id, so results
/// are deterministic.
pub fn rank_candidates(
    mut candidates: Vec<ScoredItem>,
    threshold: f32,
    top_k: usize,
) -> Vec<ScoredItem> {
    candidates.retain(|c| c.similarity >= threshold);
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then(b.created_at.cmp(&a.created_at))
            .then(a.id.cmp(&b.id))
    });
    candidates.truncate(top_k);
    candidates
}
