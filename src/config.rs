//! TOML configuration parsing and validation.
//!
//! Configuration is loaded once at startup, validated, and then shared
//! read-only (`Arc<Config>`) with every component. Secrets are never read
//! from the file: the provider API key and the JWT secret come from the
//! environment variables the file names.
//!
//! ```toml
//! [db]
//! path = "./data/brain.sqlite"
//!
//! [ai]
//! provider = "gemini"
//! generation_model = "gemini-2.5-flash"
//! embedding_model = "gemini-embedding-001"
//! embed_dim = 768
//!
//! [retrieval]
//! match_threshold = 0.4
//! match_count = 10
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! allowed_origins = ["http://localhost:3000"]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use second_brain_core::MatchPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/brain.sqlite"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Process-wide embedding dimension (`EMBED_DIM`).
    #[serde(default = "default_embed_dim")]
    pub embed_dim: usize,
    /// Deadline for each provider HTTP call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Override the provider's API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key. Defaults per provider.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            embed_dim: default_embed_dim(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
            api_key_env: None,
        }
    }
}

impl AiConfig {
    /// Name of the environment variable the API key is read from.
    pub fn api_key_var(&self) -> String {
        if let Some(var) = &self.api_key_env {
            return var.clone();
        }
        match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY".to_string(),
            _ => "GEMINI_API_KEY".to_string(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}
fn default_embed_dim() -> usize {
    768
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,
    #[serde(default = "default_match_count")]
    pub match_count: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            match_count: default_match_count(),
        }
    }
}

impl RetrievalConfig {
    pub fn policy(&self) -> Result<MatchPolicy> {
        Ok(MatchPolicy::new(self.match_threshold, self.match_count)?)
    }
}

fn default_match_threshold() -> f32 {
    second_brain_core::retrieval::DEFAULT_MATCH_THRESHOLD
}
fn default_match_count() -> usize {
    second_brain_core::retrieval::DEFAULT_MATCH_COUNT
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// CORS origins; `"*"` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: default_allowed_origins(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Verify HS256 bearer token signatures.
    #[serde(default)]
    pub verify_signature: bool,
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            verify_signature: false,
            secret_env: default_secret_env(),
        }
    }
}

fn default_secret_env() -> String {
    "JWT_SECRET".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    match config.ai.provider.as_str() {
        "gemini" | "openai" => {}
        other => bail!("Unknown AI provider: '{}'. Must be gemini or openai.", other),
    }

    if config.ai.embed_dim == 0 {
        bail!("ai.embed_dim must be > 0");
    }
    if config.ai.timeout_secs == 0 {
        bail!("ai.timeout_secs must be > 0");
    }
    if config.ai.generation_model.trim().is_empty() || config.ai.embedding_model.trim().is_empty()
    {
        bail!("ai.generation_model and ai.embedding_model must not be empty");
    }

    config
        .retrieval
        .policy()
        .context("Invalid [retrieval] settings")?;

    if config.server.request_timeout_secs == 0 {
        bail!("server.request_timeout_secs must be > 0");
    }

    Ok(())
}
