//! Error taxonomy for the document pipeline.
//!
//! Every stage returns [`RagError`]. Nothing in the pipeline retries or
//! falls back: an error aborts the current action (upload or question) and
//! is surfaced to the caller as-is. The HTTP layer maps each variant onto a
//! status code and a machine-readable error code, see
//! [`RagError::code`].

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T, E = RagError> = std::result::Result<T, E>;

/// Failure of a pipeline stage or of a session action.
#[derive(Debug, Error)]
pub enum RagError {
    /// The uploaded bytes could not be parsed as a PDF, or contained no text.
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    /// A model-serving endpoint was unreachable or answered with an error status.
    #[error("{service} service unavailable: {message}")]
    ServiceUnavailable {
        service: &'static str,
        message: String,
    },

    /// A model-serving endpoint answered with an unexpected shape.
    #[error("malformed {service} response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    /// A question was asked before any document was indexed.
    #[error("no document has been indexed yet")]
    NoDocument,

    /// The question was empty or whitespace only.
    #[error("question must not be empty")]
    EmptyQuestion,

    /// Writing or removing the transient copy of the upload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub(crate) fn unavailable(service: &'static str, message: impl Into<String>) -> Self {
        RagError::ServiceUnavailable {
            service,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        RagError::MalformedResponse {
            service,
            message: message.into(),
        }
    }

    /// Machine-readable error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            RagError::Extraction(_) => "extraction_failed",
            RagError::ServiceUnavailable { .. } => "service_unavailable",
            RagError::MalformedResponse { .. } => "malformed_response",
            RagError::NoDocument => "no_document",
            RagError::EmptyQuestion => "bad_request",
            RagError::Io(_) => "internal",
        }
    }
}
