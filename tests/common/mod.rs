//! Shared fixtures: hand-built PDFs and deterministic stand-ins for the
//! embedding and generation services.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdf_rag::config::Config;
use pdf_rag::embedding::Embedder;
use pdf_rag::error::{RagError, Result};
use pdf_rag::generate::Generator;
use pdf_rag::pipeline::Backends;

// ─── PDFs ───────────────────────────────────────────────────────────

/// Build a valid PDF with one page per entry; each page shows its lines of
/// text in Helvetica. The xref table carries exact byte offsets so
/// pdf-extract can parse it.
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let page_count = pages.len();
    let mut objects: Vec<Vec<u8>> = Vec::new();

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count).into_bytes());
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec());

    for (i, lines) in pages.iter().enumerate() {
        let content_id = 5 + 2 * i;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R \
                 /Resources << /Font << /F1 3 0 R >> >> >>",
                content_id
            )
            .into_bytes(),
        );

        let mut stream = String::from("BT /F1 12 Tf 72 720 Td");
        for (n, line) in lines.iter().enumerate() {
            if n > 0 {
                stream.push_str(" 0 -16 Td");
            }
            stream.push_str(&format!(" ({}) Tj", escape_pdf_string(line)));
        }
        stream.push_str(" ET");
        objects.push(
            format!(
                "<< /Length {} >> stream\n{}\nendstream",
                stream.len(),
                stream
            )
            .into_bytes(),
        );
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj ", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b" endobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Three pages on unrelated topics; page 3 holds the launch code.
pub fn facts_pdf() -> Vec<u8> {
    pdf_with_pages(&[
        &["The lighthouse keeper polishes the brass lantern every morning."],
        &["Quarterly revenue grew by seventeen percent in the northern region."],
        &["The secret launch code is pineapple seventy two."],
    ])
}

pub fn recipe_pdf() -> Vec<u8> {
    pdf_with_pages(&[&[
        "Preheat the oven to two hundred degrees.",
        "Knead the dough for ten minutes before baking.",
    ]])
}

// ─── Config ─────────────────────────────────────────────────────────

/// Small chunks so every sentence of the fixtures is retrievable on its own.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.chunking.chunk_size = 120;
    config.chunking.chunk_overlap = 10;
    config.retrieval.top_k = 2;
    config
}

// ─── Embedding ──────────────────────────────────────────────────────

pub const DIMS: usize = 256;

/// Hashed bag-of-words vector: texts sharing words point the same way.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(14695981039346656037u64, |h, b| {
                (h ^ b as u64).wrapping_mul(1099511628211)
            });
        v[(hash % DIMS as u64) as usize] += 1.0;
    }
    v
}

/// Deterministic embedder that counts how often it is called.
#[derive(Default)]
pub struct HashingEmbedder {
    calls: AtomicUsize,
    texts: AtomicUsize,
}

impl HashingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing-test"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }
}

/// Embedder whose endpoint is always down.
pub struct UnreachableEmbedder;

#[async_trait]
impl Embedder for UnreachableEmbedder {
    fn model_name(&self) -> &str {
        "unreachable"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::ServiceUnavailable {
            service: "embedding",
            message: "connection refused".to_string(),
        })
    }
}

// ─── Generation ─────────────────────────────────────────────────────

/// Records every prompt and answers with a numbered reply.
#[derive(Default)]
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn model_name(&self) -> &str {
        "recording-test"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("answer #{}", prompts.len()))
    }
}

/// Generator whose endpoint is always down.
pub struct UnreachableGenerator;

#[async_trait]
impl Generator for UnreachableGenerator {
    fn model_name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::ServiceUnavailable {
            service: "generation",
            message: "connection refused".to_string(),
        })
    }
}

/// Backends plus typed handles to the fakes for assertions.
pub struct Fakes {
    pub embedder: Arc<HashingEmbedder>,
    pub generator: Arc<RecordingGenerator>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            embedder: Arc::new(HashingEmbedder::default()),
            generator: Arc::new(RecordingGenerator::default()),
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            embedder: self.embedder.clone(),
            generator: self.generator.clone(),
        }
    }
}
