//! Document index for taxonmerge.
//!
//! The resolution engine writes issues, identifiers and provenance as loose
//! documents and reads some of them back later. The index is an injected port
//! ([`DocumentIndex`]) so the engine never reaches for a global.
//!
//! ```text
//!   add() ──► pending ──commit()──► committed ──refresh()──► visible ──► search()
//! ```
//!
//! Writes are invisible to readers until they have been committed *and* the
//! reader has been refreshed. Callers treat commit + refresh as a barrier
//! between a write phase and a query phase.

pub mod persistence;

#[cfg(test)]
mod tests;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{pending} document(s) have not been committed")]
    Uncommitted { pending: usize },

    #[error("document has no {0} field")]
    MissingField(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// Documents and queries
// ============================================================================

/// A typed bag of multi-valued string fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub doc_type: String,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Document {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            doc_type: doc_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a value to a field.
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.add(field, value);
        self
    }

    /// Add a value when present.
    pub fn with_opt(mut self, field: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(v) = value {
            self.add(field, v);
        }
        self
    }

    pub fn add(&mut self, field: &str, value: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(value.into());
    }

    /// First value of a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn require(&self, field: &str) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| StorageError::MissingField(field.to_string()))
    }
}

/// Conjunction of exact term matches, optionally restricted to a type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub doc_type: Option<String>,
    pub terms: Vec<(String, String)>,
}

impl Query {
    pub fn of_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            terms: Vec::new(),
        }
    }

    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and(field, value)
    }

    pub fn and(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(t) = &self.doc_type {
            if &doc.doc_type != t {
                return false;
            }
        }
        self.terms
            .iter()
            .all(|(f, v)| doc.get_all(f).iter().any(|x| x == v))
    }
}

// ============================================================================
// Index port
// ============================================================================

pub trait DocumentIndex: Send + Sync {
    /// Queue a document. It stays invisible until commit + refresh.
    fn add(&self, doc: Document) -> Result<()>;

    /// Make pending documents durable.
    fn commit(&self) -> Result<()>;

    /// Reopen the reader so committed documents become searchable.
    fn refresh(&self) -> Result<()>;

    fn search(&self, query: &Query) -> Result<Vec<Document>>;

    fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.search(query)?.len())
    }

    /// Documents added but not yet committed.
    fn pending(&self) -> usize;

    /// Commit and refresh in one go.
    fn barrier(&self) -> Result<()> {
        self.commit()?;
        self.refresh()
    }
}

// ============================================================================
// In-memory index
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryIndex {
    pending: Mutex<Vec<Document>>,
    committed: RwLock<Vec<Document>>,
    visible: RwLock<Arc<Vec<Document>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every committed document, visible or not.
    pub fn committed(&self) -> Vec<Document> {
        self.committed.read().clone()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.read().len()
    }

    pub(crate) fn from_documents(docs: Vec<Document>) -> Self {
        let visible = Arc::new(docs.clone());
        Self {
            pending: Mutex::new(Vec::new()),
            committed: RwLock::new(docs),
            visible: RwLock::new(visible),
        }
    }
}

impl DocumentIndex for MemoryIndex {
    fn add(&self, doc: Document) -> Result<()> {
        self.pending.lock().push(doc);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let drained: Vec<Document> = self.pending.lock().drain(..).collect();
        if drained.is_empty() {
            return Ok(());
        }
        tracing::debug!(documents = drained.len(), "committing documents");
        self.committed.write().extend(drained);
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        let snapshot = Arc::new(self.committed.read().clone());
        *self.visible.write() = snapshot;
        Ok(())
    }

    fn search(&self, query: &Query) -> Result<Vec<Document>> {
        let visible = self.visible.read().clone();
        Ok(visible.iter().filter(|d| query.matches(d)).cloned().collect())
    }

    fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}
