//! # pdf-rag
//!
//! Ask questions about one PDF, answered by a locally hosted language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐   ┌─────────────┐
//! │  Upload  │──▶│ Extract │──▶│  Chunk  │──▶│  Embed   │──▶│ VectorIndex │
//! │ (bytes)  │   │ per page│   │1000/100 │   │ (Ollama) │   │ (in-memory) │
//! └──────────┘   └─────────┘   └─────────┘   └──────────┘   └──────┬──────┘
//!                                                                  │
//!   question ─▶ Retriever (top-k cosine) ─▶ prompt ─▶ Generator ─▶ answer
//! ```
//!
//! A [`session::Session`] owns the live document's pipeline and the chat
//! transcript. It is driven by the CLI (`pdfrag ask`, `pdfrag chat`) or by
//! the web UI (`pdfrag serve`).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF text extraction |
//! | [`chunk`] | Recursive character splitter |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | In-memory vector index |
//! | [`retrieve`] | Retrieval stage |
//! | [`generate`] | Generation stage |
//! | [`prompt`] | Prompt template |
//! | [`pipeline`] | Document processing and question answering |
//! | [`session`] | Per-session state machine |
//! | [`server`] | Web UI and JSON API |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod models;
mod ollama;
pub mod pipeline;
pub mod prompt;
pub mod retrieve;
pub mod server;
pub mod session;
