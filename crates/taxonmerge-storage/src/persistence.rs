//! JSON-lines snapshots of a [`MemoryIndex`].
//!
//! One document per line. Only committed documents are written; a snapshot
//! taken with pending writes is refused.

use crate::{Document, DocumentIndex, MemoryIndex, Result, StorageError};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub fn save_snapshot(index: &MemoryIndex, path: &Path) -> Result<usize> {
    let pending = index.pending();
    if pending > 0 {
        return Err(StorageError::Uncommitted { pending });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let docs = index.committed();
    let mut out = BufWriter::new(File::create(path)?);
    for doc in &docs {
        serde_json::to_writer(&mut out, doc)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    tracing::info!(path = %path.display(), documents = docs.len(), "saved index snapshot");
    Ok(docs.len())
}

/// Load a snapshot. The loaded documents are committed and visible.
pub fn load_snapshot(path: &Path) -> Result<MemoryIndex> {
    let reader = BufReader::new(File::open(path)?);
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line)?;
        docs.push(doc);
    }
    tracing::info!(path = %path.display(), documents = docs.len(), "loaded index snapshot");
    Ok(MemoryIndex::from_documents(docs))
}
