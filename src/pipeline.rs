//! Document processing and question answering.
//!
//! ```text
//!  upload ─▶ extract ─▶ chunk ─▶ embed ─▶ index ─┐
//!                                                │ QueryPipeline
//!  question ─▶ Retriever::query ─▶ prompt ─▶ Generator::complete ─▶ Answer
//! ```
//!
//! [`process_document`] either returns a complete [`QueryPipeline`] or an
//! error; a failing stage never leaves a partially built index behind.

use std::sync::Arc;

use serde::Serialize;

use crate::chunk::{chunk_pages, TextSplitter};
use crate::config::Config;
use crate::embedding::{Embedder, OllamaEmbedder};
use crate::error::{RagError, Result};
use crate::extract::extract_pages;
use crate::generate::{Generator, OllamaGenerator};
use crate::index::VectorIndex;
use crate::models::{ScoredChunk, UploadedFile};
use crate::prompt;
use crate::retrieve::{Retriever, VectorRetriever};

/// The remote services a pipeline talks to.
#[derive(Clone)]
pub struct Backends {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
}

impl Backends {
    /// Ollama-backed embedding and generation, both at `ollama.url`.
    pub fn ollama(config: &Config) -> Result<Self> {
        Ok(Self {
            embedder: Arc::new(OllamaEmbedder::new(config)?),
            generator: Arc::new(OllamaGenerator::new(config)?),
        })
    }
}

/// What was indexed for the current document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStats {
    pub file_name: String,
    pub pages: usize,
    pub chunks: usize,
}

/// Generated answer plus the chunks it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

/// Retrieval, prompt and generation bound to one document's index.
pub struct QueryPipeline {
    stats: DocumentStats,
    retriever: Box<dyn Retriever>,
    generator: Arc<dyn Generator>,
}

impl QueryPipeline {
    pub fn new(
        stats: DocumentStats,
        retriever: Box<dyn Retriever>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            stats,
            retriever,
            generator,
        }
    }

    pub fn stats(&self) -> &DocumentStats {
        &self.stats
    }

    /// Answer one question from the document. Earlier questions play no part.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuestion);
        }

        let sources = self.retriever.query(question).await?;
        let filled = prompt::render(&sources, question);
        tracing::debug!(
            file = %self.stats.file_name,
            sources = sources.len(),
            prompt_chars = filled.len(),
            "generating answer"
        );
        let text = self.generator.complete(&filled).await?;

        Ok(Answer { text, sources })
    }
}

/// Build a [`QueryPipeline`] for an uploaded PDF.
pub async fn process_document(
    file: UploadedFile,
    config: &Config,
    backends: &Backends,
) -> Result<QueryPipeline> {
    let file_name = file.name.clone();
    tracing::info!(file = %file_name, bytes = file.bytes.len(), "processing document");

    let pages = tokio::task::spawn_blocking(move || extract_pages(&file))
        .await
        .map_err(|e| RagError::Extraction(format!("{}: extractor aborted: {}", file_name, e)))??;

    let splitter = TextSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
    let chunks = chunk_pages(&pages, &splitter);
    if chunks.is_empty() {
        return Err(RagError::Extraction(format!(
            "{}: document produced no chunks",
            file_name
        )));
    }
    tracing::info!(
        file = %file_name,
        pages = pages.len(),
        chunks = chunks.len(),
        "document chunked"
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = backends.embedder.embed(&texts).await?;
    if vectors.len() != chunks.len() {
        return Err(RagError::malformed(
            "embedding",
            format!("expected {} embeddings, got {}", chunks.len(), vectors.len()),
        ));
    }

    let stats = DocumentStats {
        file_name,
        pages: pages.len(),
        chunks: chunks.len(),
    };
    let index = VectorIndex::build(chunks, vectors);
    let retriever = VectorRetriever::new(
        index,
        backends.embedder.clone(),
        config.retrieval.top_k,
    );
    tracing::info!(
        file = %stats.file_name,
        model = backends.embedder.model_name(),
        "document indexed"
    );

    Ok(QueryPipeline::new(
        stats,
        Box::new(retriever),
        backends.generator.clone(),
    ))
}
