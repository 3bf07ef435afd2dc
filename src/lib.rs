//! # Second Brain
//!
//! Capture notes, enrich them with an AI-generated summary, tags, and an
//! embedding, and retrieve them through owner-scoped semantic search or a
//! public, content-free listing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌──────────┐
//! │  HTTP /  │──▶│ Capture pipeline │──▶│  SQLite  │
//! │   CLI    │   │ gen + embed + tag│   │ items+vec│
//! └────┬─────┘   └──────────────────┘   └────┬─────┘
//!      │         ┌──────────────────┐        │
//!      └────────▶│ Retrieval        │◀───────┘
//!                │ owner-scoped kNN │
//!                └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! brain init                                   # create database
//! brain capture --owner me --title "RAG" < notes.md
//! brain search --owner me "retrieval augmented generation"
//! brain serve                                  # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `KnowledgeStore` |
//! | [`providers`] | Gemini / OpenAI-compatible adapters |
//! | [`identity`] | Bearer token → owner id |
//! | [`app`] | Component wiring |
//! | [`server`] | HTTP server |
//! | [`commands`] | CLI command implementations |

pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod identity;
pub mod migrate;
pub mod providers;
pub mod server;
pub mod sqlite_store;
