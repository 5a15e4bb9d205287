//! Recursive character text splitter.
//!
//! Splits page text into overlapping [`Chunk`]s of at most `chunk_size`
//! characters, sharing up to `chunk_overlap` characters with the previous
//! chunk. There is no sentence awareness: a chunk may end mid-sentence.
//!
//! # Algorithm
//!
//! 1. Pick the first separator from `"\n\n"`, `"\n"`, `" "`, `""` that occurs
//!    in the text (`""` splits into single characters).
//! 2. Split on it, keeping the separator at the start of the following piece.
//! 3. Pieces shorter than `chunk_size` are merged greedily. When the next
//!    piece would overflow, the buffer is emitted and pieces are dropped from
//!    its front until at most `chunk_overlap` characters remain.
//! 4. Pieces of `chunk_size` or more are split again with the remaining
//!    separators.
//! 5. Emitted chunks are whitespace-trimmed; empty ones are dropped.
//!
//! Lengths are counted in `char`s, never bytes.
//!
//! # Example
//!
//! ```rust
//! use pdf_rag::chunk::TextSplitter;
//!
//! let splitter = TextSplitter::new(12, 0);
//! assert_eq!(
//!     splitter.split_text("alpha beta gamma delta"),
//!     vec!["alpha beta", "gamma delta"]
//! );
//! ```

use std::collections::VecDeque;

use crate::models::{Chunk, Page};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// `chunk_overlap` must be smaller than `chunk_size`; the config loader
    /// enforces this.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();

        for piece in split_keep_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut out, &window);
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size)
                {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        push_trimmed(&mut out, &window);
        out
    }
}

fn pick_separator<'a>(
    text: &str,
    separators: &'a [&'static str],
) -> (&'static str, &'a [&'static str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split so that each separator occurrence begins the following piece.
fn split_keep_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_trimmed(out: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Chunk every page independently; chunk indices run across the whole document.
pub fn chunk_pages(pages: &[Page], splitter: &TextSplitter) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        for text in splitter.split_text(&page.text) {
            chunks.push(Chunk {
                index: chunks.len(),
                page: page.number,
                text,
            });
        }
    }
    chunks
}
