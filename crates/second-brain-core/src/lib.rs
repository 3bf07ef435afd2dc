//! # Second Brain Core
//!
//! Runtime-agnostic logic for Second Brain: the knowledge data model,
//! error taxonomy, vector utilities, AI provider traits, the content
//! enrichment service, the knowledge store abstraction, and the capture
//! and retrieval pipelines built on top of them.
//!
//! This crate contains no sqlx, HTTP client, or filesystem I/O. The
//! application crate supplies concrete [`store::KnowledgeStore`] and
//! [`provider`] implementations.
//!
//! ## Data Flow
//!
//! ```text
//! write: content ──▶ enrich (summary + tags + embedding) ──▶ merge tags ──▶ store.insert
//! read:  query   ──▶ embed ──▶ store.similarity_search(owner-scoped) ──▶ ranked items
//! ```

pub mod capture;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod models;
pub mod provider;
pub mod retrieval;
pub mod store;

pub use capture::CapturePipeline;
pub use enrich::{Enrichment, EnrichmentService};
pub use error::{BrainError, ProviderError};
pub use models::{CaptureInput, KnowledgeItem, OwnerId, PublicProjection, ScoredItem};
pub use retrieval::{MatchPolicy, RetrievalPipeline};
pub use store::KnowledgeStore;
