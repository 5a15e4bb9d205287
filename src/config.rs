//! TOML configuration.
//!
//! Every key has a default, so the application runs without a config file.
//! See [`load_config`] for validation rules.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Address of the model-serving endpoint shared by embedding and generation.
#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    /// Request timeout in seconds; `0` disables it.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            timeout_secs: 0,
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}
fn default_batch_size() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: 0.0,
        }
    }
}

/// Splitter parameters, measured in characters.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted upload body, in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Sessions unused for this many seconds are dropped; `0` keeps them forever.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_mb: default_max_upload_mb(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}
fn default_max_upload_mb() -> usize {
    200
}
fn default_session_idle_secs() -> u64 {
    3600
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check invariants that serde defaults cannot express.
pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.embedding.batch_size < 1 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }
    if config.embedding.model.trim().is_empty() {
        anyhow::bail!("embedding.model must not be empty");
    }
    if config.generation.model.trim().is_empty() {
        anyhow::bail!("generation.model must not be empty");
    }

    if config.ollama.url.trim().is_empty() {
        anyhow::bail!("ollama.url must not be empty");
    }

    if config.server.max_upload_mb == 0 {
        anyhow::bail!("server.max_upload_mb must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert_eq!(config.embedding.model, "llama3.2:3b");
        assert_eq!(config.generation.model, "llama3.2:3b");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.generation.temperature, 0.0);
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.server.max_upload_mb, 200);
        assert_eq!(config.server.session_idle_secs, 3600);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let file = write_config(
            r#"
[ollama]
url = "http://models.internal:11434"

[retrieval]
top_k = 6
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ollama.url, "http://models.internal:11434");
        assert_eq!(config.ollama.timeout_secs, 0);
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.embedding.batch_size, 64);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let file = write_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let file = write_config("[retrieval]\ntop_k = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/pdfrag.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pdfrag.toml"));
    }
}
