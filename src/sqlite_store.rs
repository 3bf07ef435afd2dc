//! SQLite-backed [`KnowledgeStore`] implementation.
//!
//! Items live in a single append-only `knowledge_items` table. Embeddings
//! are stored as little-endian f32 blobs and scored in-process with
//! cosine similarity; the owner filter is part of the SQL `WHERE` clause
//! so rows of other owners are never read during a search.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use second_brain_core::embedding::{blob_to_vec, cosine_similarity, ensure_dims, vec_to_blob};
use second_brain_core::models::NewKnowledgeItem;
use second_brain_core::store::{rank_candidates, SimilarityQuery};
use second_brain_core::{KnowledgeItem, KnowledgeStore, OwnerId, PublicProjection, ScoredItem};

pub struct SqliteStore {
    pool: SqlitePool,
    embed_dim: usize,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, embed_dim: usize) -> Self {
        Self { pool, embed_dim }
    }
}

fn ts_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).with_context(|| format!("invalid created_at: {ms}"))
}

fn parse_tags(row: &SqliteRow) -> Result<Vec<String>> {
    let tags_json: String = row.try_get("tags_json")?;
    serde_json::from_str(&tags_json).context("corrupt tags_json column")
}

#[async_trait]
impl KnowledgeStore for SqliteStore {
    async fn insert(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem> {
        ensure_dims(&item.embedding, self.embed_dim)?;

        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let tags_json = serde_json::to_string(&item.tags)?;
        let blob = vec_to_blob(&item.embedding);

        sqlx::query(
            r#"
            INSERT INTO knowledge_items (id, owner_id, title, content, summary,
                                         tags_json, embedding, embedding_dims, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(item.owner_id.as_str())
        .bind(&item.title)
        .bind(&item.content)
        .bind(&item.summary)
        .bind(&tags_json)
        .bind(&blob)
        .bind(item.embedding.len() as i64)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .context("insert into knowledge_items")?;

        Ok(KnowledgeItem {
            id,
            owner_id: item.owner_id.clone(),
            title: item.title.clone(),
            content: item.content.clone(),
            summary: item.summary.clone(),
            tags: item.tags.clone(),
            embedding: item.embedding.clone(),
            // Round-trip through millis so the returned value matches what a read yields.
            created_at: ts_from_millis(created_at.timestamp_millis())?,
        })
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<PublicProjection>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, summary, tags_json, created_at
            FROM knowledge_items
            WHERE owner_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PublicProjection {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    summary: row.try_get("summary")?,
                    tags: parse_tags(row)?,
                    created_at: ts_from_millis(row.try_get("created_at")?)?,
                })
            })
            .collect()
    }

    async fn similarity_search(&self, query: &SimilarityQuery<'_>) -> Result<Vec<ScoredItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, content, summary, tags_json, embedding, created_at
            FROM knowledge_items
            WHERE owner_id = ?
            "#,
        )
        .bind(query.owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.try_get("embedding")?;
            let vec = blob_to_vec(&blob);
            let owner_id: String = row.try_get("owner_id")?;

            candidates.push(ScoredItem {
                id: row.try_get("id")?,
                owner_id: OwnerId::new(owner_id),
                title: row.try_get("title")?,
                content: row.try_get("content")?,
                summary: row.try_get("summary")?,
                tags: parse_tags(row)?,
                created_at: ts_from_millis(row.try_get("created_at")?)?,
                similarity: cosine_similarity(query.embedding, &vec),
            });
        }

        Ok(rank_candidates(candidates, query.threshold, query.top_k))
    }
}
