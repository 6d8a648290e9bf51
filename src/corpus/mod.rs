//! Document corpus store
//!
//! The report links every claim back to a text span in its source document.
//! This module is the lookup side of that link: a `documents` table keyed by
//! both the parent document id and the child segment id, with the full
//! extracted text. Justifications usually carry only one of the two ids, so
//! lookups accept either.

mod sqlite;

pub use sqlite::SqliteCorpus;

use crate::resolve::Justification;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during corpus operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document not found: {0}")]
    DocumentNotFound(String),
}

/// Result type for corpus operations
pub type CorpusResult<T> = Result<T, CorpusError>;

/// A corpus document: full extracted text plus its identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Parent document identifier
    pub parent_id: String,
    /// Child segment identifier
    pub child_id: String,
    /// Language identifier
    pub lang_id: String,
    /// Full extracted text
    #[serde(rename = "fulltext")]
    pub full_text: String,
}

impl Document {
    /// The literal text of a justification span within this document
    ///
    /// Offsets are inclusive-inclusive character positions; the excerpt is
    /// `full_text[span_start..=span_end]` counted in characters, clamped to
    /// the document's length.
    pub fn excerpt(&self, justification: &Justification) -> String {
        let len = justification
            .span_end
            .saturating_sub(justification.span_start)
            + 1;
        self.full_text
            .chars()
            .skip(justification.span_start)
            .take(len)
            .collect()
    }
}

/// Trait for document stores
///
/// `lookup` is keyed by either a parent document id or a child segment id;
/// the store resolves whichever it is given.
pub trait DocumentStore {
    /// Find a document by parent or child id
    fn lookup(&self, id: &str) -> CorpusResult<Option<Document>>;

    /// Find a document by parent or child id, failing when absent
    fn require(&self, id: &str) -> CorpusResult<Document> {
        self.lookup(id)?
            .ok_or_else(|| CorpusError::DocumentNotFound(id.to_string()))
    }
}
