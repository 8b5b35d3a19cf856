//! Error types for the engine.

use ordermark_document::DocumentError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort a numbering run.
///
/// Per-entity write failures never show up here; they are collected in the
/// run's `WriteReport`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host refused a batch or model operation.
    #[error("document error: {0}")]
    Document(DocumentError),

    /// The user canceled the operation.
    #[error("operation canceled")]
    Canceled,

    /// No target attribute was chosen.
    #[error("no target attribute selected")]
    NoTarget,

    /// A report order could not be determined.
    #[error("report order unavailable: {0}")]
    ReportOrder(String),

    /// The mark range does not fit in an `i64`.
    #[error("mark sequence of {count} starting at {start} overflows")]
    SequenceOverflow { start: i64, count: usize },

    /// Configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<DocumentError> for EngineError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Canceled => Self::Canceled,
            other => Self::Document(other),
        }
    }
}
