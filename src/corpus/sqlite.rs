//! SQLite corpus backend
//!
//! A single `documents` table, one row per document, indexed by both parent
//! and child id. Documents are imported in bulk from JSONL (one `Document`
//! object per line).

use super::{CorpusResult, Document, DocumentStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed document store
///
/// Thread-safe via an internal mutex on the connection.
pub struct SqliteCorpus {
    conn: Mutex<Connection>,
}

impl SqliteCorpus {
    /// Open or create a corpus database at the given path
    pub fn open(path: impl AsRef<Path>) -> CorpusResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory corpus (useful for testing)
    pub fn open_in_memory() -> CorpusResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> CorpusResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                parent_id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                lang_id TEXT NOT NULL,
                fulltext TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_child
                ON documents(child_id);
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace a batch of documents in one transaction
    pub fn insert_documents(&self, documents: &[Document]) -> CorpusResult<usize> {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;
        for document in documents {
            tx.execute(
                "INSERT OR REPLACE INTO documents(parent_id, child_id, lang_id, fulltext)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    document.parent_id,
                    document.child_id,
                    document.lang_id,
                    document.full_text
                ],
            )?;
        }
        tx.commit()?;
        Ok(documents.len())
    }

    /// Import documents from JSONL, one `Document` object per line
    ///
    /// Blank lines are skipped. Returns the number of documents imported.
    pub fn import_jsonl(&self, reader: impl Read) -> CorpusResult<usize> {
        let mut documents = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            documents.push(serde_json::from_str::<Document>(&line)?);
        }
        self.insert_documents(&documents)
    }

    /// Number of documents in the corpus
    pub fn len(&self) -> CorpusResult<usize> {
        let conn = lock(&self.conn);
        let count: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Whether the corpus holds no documents
    pub fn is_empty(&self) -> CorpusResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl DocumentStore for SqliteCorpus {
    fn lookup(&self, id: &str) -> CorpusResult<Option<Document>> {
        let conn = lock(&self.conn);
        let document = conn
            .query_row(
                "SELECT parent_id, child_id, lang_id, fulltext FROM documents
                 WHERE parent_id = ?1 OR child_id = ?1",
                params![id],
                |row| {
                    Ok(Document {
                        parent_id: row.get(0)?,
                        child_id: row.get(1)?,
                        lang_id: row.get(2)?,
                        full_text: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(document)
    }
}

fn lock(conn: &Mutex<Connection>) -> std::sync::MutexGuard<'_, Connection> {
    match conn.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
