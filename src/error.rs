//! Pipeline Errors
//!
//! One taxonomy for everything the rewrite pipeline can report. Only
//! `UnsupportedFormat`, `Document` and `Io` ever fail a job; `Service`
//! is recovered at each call site and `MissingColumns` degrades to an
//! empty reference table.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad upload (empty file, unknown extension). Rejected before a job exists.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The extractor does not understand the file kind.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The text-generation capability failed (network, quota, timeout).
    #[error("text generation failed: {0}")]
    Service(String),

    /// A reference table is missing expected column headers.
    #[error("{} is missing columns: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Reading or writing a structured document failed.
    #[error("document error: {0}")]
    Document(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Errors the caller is expected to absorb with a local fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Service(_) | PipelineError::MissingColumns { .. })
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
