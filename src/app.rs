//! Application wiring.
//!
//! [`App`] owns the configured store, providers, and the two pipelines.
//! It is built once at startup and shared read-only by the HTTP server
//! and the CLI commands.

use anyhow::Result;
use std::sync::Arc;

use second_brain_core::provider::{Embedder, TextGenerator};
use second_brain_core::{CapturePipeline, EnrichmentService, KnowledgeStore, RetrievalPipeline};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::providers::create_providers;
use crate::sqlite_store::SqliteStore;

pub struct App {
    pub config: Arc<Config>,
    pub store: Arc<dyn KnowledgeStore>,
    pub enricher: Arc<EnrichmentService>,
    pub capture: Arc<CapturePipeline>,
    pub retrieval: Arc<RetrievalPipeline>,
}

impl App {
    /// Open the database, ensure the schema, and build the configured providers.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;
        let (generator, embedder) = create_providers(&config.ai)?;
        Self::with_parts(config.clone(), generator, embedder, store)
    }

    /// Assemble an app from explicit parts.
    pub fn with_parts(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Result<Self> {
        let policy = config.retrieval.policy()?;
        let enricher = Arc::new(EnrichmentService::new(
            generator,
            embedder,
            config.ai.embed_dim,
        ));

        Ok(Self {
            capture: Arc::new(CapturePipeline::new(enricher.clone(), store.clone())),
            retrieval: Arc::new(RetrievalPipeline::new(
                enricher.clone(),
                store.clone(),
                policy,
            )),
            enricher,
            store,
            config: Arc::new(config),
        })
    }
}

/// SQLite store for `config`, with migrations applied.
pub async fn open_store(config: &Config) -> Result<Arc<dyn KnowledgeStore>> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    Ok(Arc::new(SqliteStore::new(pool, config.ai.embed_dim)))
}
