//! Per-session conversation state.
//!
//! A [`Session`] owns at most one document's [`QueryPipeline`] plus the chat
//! transcript, and moves between two states:
//!
//! ```text
//!            upload(new name) ok
//!   Idle ────────────────────────▶ Ready ──┐ ask() appends to transcript
//!    ▲                               │  ◀──┘
//!    │           clear()             │ upload(other name) ok: swap, reset transcript
//!    └───────────────────────────────┘ upload(other name) err: unchanged
//! ```
//!
//! Change detection is keyed on the file *name* only: re-uploading the same
//! name is a no-op even if the bytes differ, and a different name always
//! rebuilds even for identical bytes.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::models::{ChatMessage, UploadedFile};
use crate::pipeline::{process_document, Answer, Backends, DocumentStats, QueryPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Ready,
}

/// Result of [`Session::upload`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    /// A new document was processed and is now live.
    Indexed(DocumentStats),
    /// The file name matches the live document; nothing was rebuilt.
    Unchanged,
}

pub struct Session {
    config: Arc<Config>,
    backends: Backends,
    current_file: Option<String>,
    pipeline: Option<QueryPipeline>,
    transcript: Vec<ChatMessage>,
}

impl Session {
    pub fn new(config: Arc<Config>, backends: Backends) -> Self {
        Self {
            config,
            backends,
            current_file: None,
            pipeline: None,
            transcript: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.pipeline.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        }
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn document(&self) -> Option<&DocumentStats> {
        self.pipeline.as_ref().map(|p| p.stats())
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Index `file` unless it has the same name as the live document.
    ///
    /// The new pipeline is built before anything is replaced: on failure the
    /// previous document, pipeline and transcript stay live.
    pub async fn upload(&mut self, file: UploadedFile) -> Result<UploadOutcome> {
        if self.current_file.as_deref() == Some(file.name.as_str()) {
            tracing::debug!(file = %file.name, "same file name, keeping current index");
            return Ok(UploadOutcome::Unchanged);
        }

        let name = file.name.clone();
        let pipeline = process_document(file, &self.config, &self.backends).await?;
        let stats = pipeline.stats().clone();

        if let Some(previous) = self.current_file.replace(name) {
            tracing::info!(previous = %previous, file = %stats.file_name, "document replaced");
        }
        self.pipeline = Some(pipeline);
        self.transcript.clear();
        Ok(UploadOutcome::Indexed(stats))
    }

    /// Answer a question about the live document and record the exchange.
    ///
    /// On failure the transcript is left untouched.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let pipeline = self.pipeline.as_ref().ok_or(RagError::NoDocument)?;
        let question = question.trim();
        let answer = pipeline.ask(question).await?;

        self.transcript.push(ChatMessage::user(question));
        self.transcript.push(ChatMessage::assistant(answer.text.clone()));
        Ok(answer)
    }

    /// Drop the document, pipeline and transcript, returning to the initial state.
    pub fn clear(&mut self) {
        if let Some(name) = self.current_file.take() {
            tracing::info!(file = %name, "session cleared");
        }
        self.pipeline = None;
        self.transcript.clear();
    }
}
