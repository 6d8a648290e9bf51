//! Report rendering
//!
//! Consumes a resolved [`Hypothesis`](crate::resolve::Hypothesis) and writes
//! a human-readable HTML report: claims grouped by cluster, every claim
//! linked to its supporting text span in a per-document page.

mod html;

pub use html::{PageSpans, ReportWriter};

use thiserror::Error;

/// Errors that can occur while rendering or writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("corpus error: {0}")]
    Corpus(#[from] crate::corpus::CorpusError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// List names, handles and types per record instead of the compact line
    pub verbose: bool,
}
