//! Embedding provider abstraction and the Ollama implementation.
//!
//! [`Embedder`] is the seam the pipeline depends on; [`OllamaEmbedder`]
//! calls `POST /api/embed` on the configured Ollama URL:
//!
//! ```text
//! → { "model": "llama3.2:3b", "input": ["chunk one", "chunk two"] }
//! ← { "embeddings": [[0.1, ...], [0.3, ...]] }
//! ```
//!
//! Texts are sent in batches of `embedding.batch_size`. Every response must
//! contain exactly one vector per input, all of the same length.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::ollama;

const SERVICE: &str = "embedding";

/// Computes one embedding vector per input text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"llama3.2:3b"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, returning vectors in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RagError::malformed(SERVICE, "empty embedding response"))
}

/// Embedding client for a local Ollama instance.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    batch_size: usize,
}

impl OllamaEmbedder {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: ollama::build_client(&config.ollama)?,
            url: config.ollama.url.clone(),
            model: config.embedding.model.clone(),
            batch_size: config.embedding.batch_size.max(1),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            tracing::debug!(model = %self.model, batch = batch.len(), "embedding batch");
            let body = serde_json::json!({
                "model": self.model,
                "input": batch,
            });
            let json = ollama::post_json(&self.client, &self.url, "api/embed", &body, SERVICE).await?;
            let batch_vectors = parse_embed_response(&json)?;

            if batch_vectors.len() != batch.len() {
                return Err(RagError::malformed(
                    SERVICE,
                    format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        batch_vectors.len()
                    ),
                ));
            }
            vectors.extend(batch_vectors);
        }

        check_dimensions(&vectors)?;
        Ok(vectors)
    }
}

fn parse_embed_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| RagError::malformed(SERVICE, "missing embeddings array"))?;

    let mut result = Vec::with_capacity(embeddings.len());

    for embedding in embeddings {
        let values = embedding
            .as_array()
            .ok_or_else(|| RagError::malformed(SERVICE, "embedding is not an array"))?;
        let vec = values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| RagError::malformed(SERVICE, "embedding value is not a number"))
            })
            .collect::<Result<Vec<f32>>>()?;
        result.push(vec);
    }

    Ok(result)
}

fn check_dimensions(vectors: &[Vec<f32>]) -> Result<()> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    if first.is_empty() {
        return Err(RagError::malformed(SERVICE, "embedding has zero dimensions"));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != first.len()) {
        return Err(RagError::malformed(
            SERVICE,
            format!(
                "inconsistent embedding dimensions: {} vs {}",
                first.len(),
                bad.len()
            ),
        ));
    }
    Ok(())
}
