//! Retrieval stage: question text in, most similar chunks out.

use std::sync::Arc;

use async_trait::async_trait;

use crate::embedding::{embed_query, Embedder};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::models::ScoredChunk;

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn query(&self, text: &str) -> Result<Vec<ScoredChunk>>;
}

/// Embeds the question and searches one document's [`VectorIndex`].
pub struct VectorRetriever {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn query(&self, text: &str) -> Result<Vec<ScoredChunk>> {
        if text.trim().is_empty() {
            return Err(RagError::EmptyQuestion);
        }
        let query_vec = embed_query(self.embedder.as_ref(), text).await?;
        let hits = self.index.search(&query_vec, self.top_k);
        for hit in &hits {
            tracing::debug!(
                chunk = hit.chunk.index,
                page = hit.chunk.page,
                score = hit.score,
                "retrieved"
            );
        }
        Ok(hits)
    }
}
