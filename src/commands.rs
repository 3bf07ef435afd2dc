//! CLI command implementations.
//!
//! These run the same pipelines as the HTTP server, but as a trusted
//! local caller: the owner is given on the command line instead of being
//! resolved from a bearer token.

use anyhow::{bail, Context, Result};
use std::io::Read;

use second_brain_core::enrich::{build_prompt, parse_generation};
use second_brain_core::provider::{Embedder, TextGenerator};
use second_brain_core::{CaptureInput, KnowledgeStore, OwnerId};

use crate::app::{open_store, App};
use crate::config::Config;
use crate::providers::create_providers;

const SMOKE_TEST_TEXT: &str = "Rust is a systems programming language focused on memory safety \
    without garbage collection, achieved through ownership and borrowing.";

pub async fn run_capture(
    config: &Config,
    owner: &str,
    title: String,
    tags: Vec<String>,
    content: Option<String>,
) -> Result<()> {
    let content = match content {
        Some(c) => c,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read content from stdin")?;
            buf
        }
    };

    let app = App::from_config(config).await?;
    let owner = OwnerId::new(owner);
    let item = app
        .capture
        .capture(
            Some(&owner),
            CaptureInput {
                title,
                content,
                tags,
            },
        )
        .await?;

    println!("Captured {}", item.id);
    println!("  title:   {}", item.title);
    println!("  summary: {}", item.summary);
    println!("  tags:    {}", item.tags.join(", "));
    Ok(())
}

pub async fn run_search(config: &Config, owner: &str, query: &str) -> Result<()> {
    let app = App::from_config(config).await?;
    let owner = OwnerId::new(owner);
    let hits = app.retrieval.search(Some(&owner), query).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} ({})",
            i + 1,
            hit.similarity,
            hit.title,
            hit.created_at.format("%Y-%m-%d")
        );
        println!("    {}", hit.summary);
        if !hit.tags.is_empty() {
            println!("    tags: {}", hit.tags.join(", "));
        }
        println!("    id: {}", hit.id);
    }
    Ok(())
}

/// List an owner's public projection. Needs no provider credentials.
pub async fn run_public(config: &Config, owner: &str) -> Result<()> {
    let store = open_store(config).await?;
    let items = store.list_by_owner(&OwnerId::new(owner)).await?;

    if items.is_empty() {
        println!("No items for {}.", owner);
        return Ok(());
    }

    for item in &items {
        println!(
            "{}  {}  [{}]",
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.title,
            item.tags.join(", ")
        );
        println!("    {}", item.summary);
    }
    Ok(())
}

/// Provider smoke test: one generation call and one embedding call.
pub async fn run_check(config: &Config) -> Result<()> {
    let (generator, embedder) = create_providers(&config.ai)?;

    println!("Provider:   {}", config.ai.provider);
    println!("Generation: {}", generator.model_name());
    let raw = generator.generate(&build_prompt(SMOKE_TEST_TEXT)).await?;
    let (summary, tags) = parse_generation(&raw).into_parts();
    println!("  summary:  {}", summary);
    println!("  tags:     {}", tags.join(", "));

    println!("Embedding:  {}", embedder.model_name());
    let vector = embedder.embed(SMOKE_TEST_TEXT, config.ai.embed_dim).await?;
    println!(
        "  dims:     {} (expected {})",
        vector.len(),
        config.ai.embed_dim
    );

    if vector.len() != config.ai.embed_dim {
        bail!(
            "embedding model returned {} dimensions, expected {}",
            vector.len(),
            config.ai.embed_dim
        );
    }
    println!("OK");
    Ok(())
}
