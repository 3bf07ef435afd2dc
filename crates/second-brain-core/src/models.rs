//! Core data models used throughout Second Brain.
//!
//! These types represent the captured knowledge items and the reduced
//! views of them that flow through the capture and retrieval pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the user who owns a knowledge item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-supplied capture payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A fully enriched item ready to be persisted.
///
/// Has no id or timestamp yet; both are assigned by the store on insert.
#[derive(Debug, Clone)]
pub struct NewKnowledgeItem {
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub embedding: Vec<f32>,
}

/// A persisted knowledge item.
#[derive(Debug, Clone)]
pub struct KnowledgeItem {
    /// Store-assigned UUID.
    pub id: String,
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    /// AI-generated one-sentence summary.
    pub summary: String,
    /// User tags unioned with AI tags, de-duplicated.
    pub tags: Vec<String>,
    /// Vector of exactly `embed_dim` components.
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// Public view of an item: safe to expose without authentication.
///
/// Deliberately has no `content` or `embedding` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicProjection {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A similarity search hit, ranked by `similarity` descending.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
    pub id: String,
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Cosine similarity to the query embedding.
    pub similarity: f32,
}

/// Capture response body: the stored item minus the raw vector.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedItem {
    pub id: String,
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub embedding_dims: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&KnowledgeItem> for CapturedItem {
    fn from(item: &KnowledgeItem) -> Self {
        Self {
            id: item.id.clone(),
            owner_id: item.owner_id.clone(),
            title: item.title.clone(),
            content: item.content.clone(),
            summary: item.summary.clone(),
            tags: item.tags.clone(),
            embedding_dims: item.embedding.len(),
            created_at: item.created_at,
        }
    }
}

impl From<&KnowledgeItem> for PublicProjection {
    fn from(item: &KnowledgeItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            summary: item.summary.clone(),
            tags: item.tags.clone(),
            created_at: item.created_at,
        }
    }
}
