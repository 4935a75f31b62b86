//! TOML configuration parsing and validation.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration (local embeddings, Pinecone index `index1`, Gemini).
//! API keys are never read from the file; they come from the environment
//! (`OPENAI_API_KEY`, `PINECONE_API_KEY`, `GOOGLE_API_KEY`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use readme_rag_core::chunk::ChunkConfig;
use readme_rag_core::pipeline::IndexOptions;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (OpenAI-compatible or Ollama endpoint).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_provider")]
    pub provider: String,
    #[serde(default = "default_index_name")]
    pub name: String,
    /// Expected vector dimensionality of the index.
    #[serde(default = "default_index_dims")]
    pub dims: usize,
    /// Data-plane host. Resolved from the control plane when unset.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_control_url")]
    pub control_url: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: default_index_provider(),
            name: default_index_name(),
            dims: default_index_dims(),
            host: None,
            control_url: default_control_url(),
            namespace: None,
            upsert_batch_size: default_upsert_batch_size(),
            top_k: default_top_k(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_provider() -> String {
    "pinecone".to_string()
}
fn default_index_name() -> String {
    "index1".to_string()
}
fn default_index_dims() -> usize {
    1024
}
fn default_control_url() -> String {
    "https://api.pinecone.io".to_string()
}
fn default_upsert_batch_size() -> usize {
    100
}
fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_generation_url")]
    pub url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            temperature: default_temperature(),
            url: default_generation_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "gemini".to_string()
}
fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_generation_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_generation_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Validated chunking parameters.
    pub fn chunk_config(&self) -> Result<ChunkConfig> {
        ChunkConfig::new(self.chunking.chunk_size, self.chunking.overlap)
            .with_context(|| "invalid [chunking] section")
    }

    pub fn index_options(&self) -> Result<IndexOptions> {
        Ok(IndexOptions {
            chunking: self.chunk_config()?,
            embed_batch_size: self.embedding.batch_size,
            upsert_batch_size: self.index.upsert_batch_size,
        })
    }

    /// Check cross-field consistency. Called by [`load_config`].
    pub fn validate(&self) -> Result<()> {
        // Validate chunking
        self.chunk_config()?;

        // Validate embedding
        match self.embedding.provider.as_str() {
            "disabled" | "local" => {}
            "openai" | "ollama" => {
                if self.embedding.model.is_none() {
                    anyhow::bail!(
                        "embedding.model must be specified when provider is '{}'",
                        self.embedding.provider
                    );
                }
                if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                    anyhow::bail!(
                        "embedding.dims must be > 0 when provider is '{}'",
                        self.embedding.provider
                    );
                }
            }
            other => anyhow::bail!(
                "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
                other
            ),
        }
        if self.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be > 0");
        }

        // Validate index
        match self.index.provider.as_str() {
            "pinecone" | "memory" => {}
            other => anyhow::bail!(
                "Unknown index provider: '{}'. Must be pinecone or memory.",
                other
            ),
        }
        if self.index.name.trim().is_empty() {
            anyhow::bail!("index.name must not be empty");
        }
        if self.index.dims == 0 {
            anyhow::bail!("index.dims must be > 0");
        }
        if self.index.upsert_batch_size == 0 {
            anyhow::bail!("index.upsert_batch_size must be > 0");
        }
        if self.index.top_k == 0 {
            anyhow::bail!("index.top_k must be >= 1");
        }
        if let Some(dims) = self.embedding.dims {
            if self.embedding.is_enabled() && dims != self.index.dims {
                anyhow::bail!(
                    "embedding.dims ({}) does not match index.dims ({})",
                    dims,
                    self.index.dims
                );
            }
        }

        // Validate generation
        match self.generation.provider.as_str() {
            "gemini" | "disabled" => {}
            other => anyhow::bail!(
                "Unknown generation provider: '{}'. Must be gemini or disabled.",
                other
            ),
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Read a required secret from the environment.
pub fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => anyhow::bail!("{} environment variable not set", name),
    }
}
