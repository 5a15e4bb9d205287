//! The fixed question-answering prompt.
//!
//! Only the retrieved context and the current question are interpolated.
//! The chat transcript is never included, so every question is answered
//! independently.

use crate::models::ScoredChunk;

/// Join retrieved chunk texts, best match first, separated by a blank line.
pub fn format_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render(hits: &[ScoredChunk], question: &str) -> String {
    format!(
        "Answer based ONLY on context: {}\nQuestion: {}",
        format_context(hits),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn hit(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                index: 0,
                page: 1,
                text: text.to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn renders_context_and_question() {
        let prompt = render(&[hit("Cats sleep a lot."), hit("Dogs bark.")], "Do cats sleep?");
        assert_eq!(
            prompt,
            "Answer based ONLY on context: Cats sleep a lot.\n\nDogs bark.\nQuestion: Do cats sleep?"
        );
    }

    #[test]
    fn braces_in_chunks_are_kept_verbatim() {
        let prompt = render(&[hit("literal {question} text")], "why?");
        assert!(prompt.contains("literal {question} text"));
        assert!(prompt.ends_with("Question: why?"));
    }
}
