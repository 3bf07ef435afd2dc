//! # Second Brain CLI (`brain`)
//!
//! The `brain` binary initializes the database, runs the HTTP server, and
//! offers local capture, search, and listing commands that go through the
//! same pipelines as the server.
//!
//! ## Usage
//!
//! ```bash
//! brain --config ./config/brain.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `brain init` | Create the SQLite database and run schema migrations |
//! | `brain serve` | Start the HTTP server |
//! | `brain capture --owner <id> --title <t>` | Enrich and store a note (content from `--content` or stdin) |
//! | `brain search --owner <id> "<query>"` | Semantic search over one owner's notes |
//! | `brain public <owner>` | List an owner's public projection |
//! | `brain check` | Smoke-test the configured AI provider |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use second_brain::{commands, config, migrate, server};

/// Second Brain: capture notes, enrich them with AI, and search them semantically.
#[derive(Parser)]
#[command(
    name = "brain",
    about = "Second Brain — AI-enriched note capture and owner-scoped semantic search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/brain.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Capture a note for an owner.
    Capture {
        /// Owner id the note is stored under.
        #[arg(long)]
        owner: String,

        #[arg(long)]
        title: String,

        /// Tag to attach (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Note content. Read from stdin when omitted.
        #[arg(long)]
        content: Option<String>,
    },

    /// Semantic search over one owner's notes.
    Search {
        #[arg(long)]
        owner: String,

        query: String,
    },

    /// List an owner's public projection (no content, no embeddings).
    Public { owner: String },

    /// Call the configured generation and embedding models once each.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Capture {
            owner,
            title,
            tags,
            content,
        } => {
            commands::run_capture(&cfg, &owner, title, tags, content).await?;
        }
        Commands::Search { owner, query } => {
            commands::run_search(&cfg, &owner, &query).await?;
        }
        Commands::Public { owner } => {
            commands::run_public(&cfg, &owner).await?;
        }
        Commands::Check => {
            commands::run_check(&cfg).await?;
        }
    }

    Ok(())
}
