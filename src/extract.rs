//! PDF text extraction.
//!
//! The upload is written to a transient `.pdf` file, handed to
//! `pdf-extract` page by page, and the file is removed again before this
//! module returns. Removal happens on every path, including extraction
//! failure, because the temp file is owned by a [`tempfile::NamedTempFile`]
//! guard.

use std::io::Write;
use std::path::Path;

use crate::error::{RagError, Result};
use crate::models::{Page, UploadedFile};

/// Extract the text of every page, using the system temp directory for the
/// transient copy.
pub fn extract_pages(file: &UploadedFile) -> Result<Vec<Page>> {
    extract_pages_in(&std::env::temp_dir(), file)
}

/// Like [`extract_pages`], with an explicit directory for the transient copy.
pub fn extract_pages_in(dir: &Path, file: &UploadedFile) -> Result<Vec<Page>> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdfrag-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    tmp.write_all(&file.bytes)?;
    tmp.flush()?;

    // On error the guard is dropped here, which deletes the file.
    let texts = pdf_extract::extract_text_by_pages(tmp.path())
        .map_err(|e| RagError::Extraction(format!("{}: {}", file.name, e)))?;
    tmp.close()?;

    into_pages(&file.name, texts)
}

fn into_pages(name: &str, texts: Vec<String>) -> Result<Vec<Page>> {
    let pages: Vec<Page> = texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page { number: i + 1, text })
        .collect();

    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(RagError::Extraction(format!(
            "{}: no extractable text in {} page(s)",
            name,
            pages.len()
        )));
    }

    Ok(pages)
}
