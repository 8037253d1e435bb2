//! Single-file JSON vector store.
//!
//! Every call re-reads the whole file, so there is no cache to go stale.
//! Mutations run under an in-process writer lock: load, mutate in memory,
//! then write a temp file next to the store and rename it into place. A
//! reader therefore sees either the old or the new file, never a partial one.
//! Writers in different processes are not coordinated.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorIndex;
use docqa_core::types::{summarize, uniform_dimension, validate_batch, DocumentSummary, IndexedVector, NewVector};

use crate::schema::{OnDisk, StoreFileRef, SCHEMA_VERSION};

pub struct FileVectorIndex {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileVectorIndex {
    /// No I/O happens here; a missing file reads as an empty index.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn load(&self) -> Result<Vec<IndexedVector>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::storage("read store", e)),
        };
        let on_disk: OnDisk = serde_json::from_slice(&bytes).map_err(|e| Error::storage("parse store", e))?;
        match on_disk {
            OnDisk::Versioned(file) => {
                if file.schema_version > SCHEMA_VERSION {
                    return Err(Error::storage(
                        "parse store",
                        format!("unsupported schema version {} (max {})", file.schema_version, SCHEMA_VERSION),
                    ));
                }
                if let Some(dim) = file.dimension {
                    if let Some(bad) = file.vectors.iter().find(|v| v.dimension() != dim) {
                        return Err(Error::storage(
                            "parse store",
                            format!(
                                "{}#{} has {} values but the store declares {}",
                                bad.document_id,
                                bad.position,
                                bad.dimension(),
                                dim
                            ),
                        ));
                    }
                }
                Ok(file.vectors)
            }
            OnDisk::Legacy(rows) => {
                tracing::debug!(path = %self.path.display(), rows = rows.len(), "read legacy store; upgrading on next write");
                Ok(rows.into_iter().map(IndexedVector::from).collect())
            }
        }
    }

    fn persist(&self, vectors: &[IndexedVector]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Error::storage("create store directory", e))?;

        let body = StoreFileRef { schema_version: SCHEMA_VERSION, dimension: uniform_dimension(vectors), vectors };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::storage("create temp file", e))?;
        {
            let mut w = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut w, &body).map_err(|e| Error::storage("serialize store", e))?;
            w.flush().map_err(|e| Error::storage("write store", e))?;
        }
        tmp.as_file().sync_all().map_err(|e| Error::storage("sync store", e))?;
        tmp.persist(&self.path).map_err(|e| Error::storage("replace store", e.error))?;
        Ok(())
    }

    /// Load, apply `f`, and persist when it reports a change. An error from
    /// `f` leaves the file untouched.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<IndexedVector>) -> Result<(R, bool)>) -> Result<R> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut vectors = self.load()?;
        let (out, changed) = f(&mut vectors)?;
        if changed { self.persist(&vectors)?; }
        Ok(out)
    }
}

fn remove_document(vectors: &mut Vec<IndexedVector>, document_id: &str) -> usize {
    let before = vectors.len();
    vectors.retain(|v| v.document_id != document_id);
    before - vectors.len()
}

impl VectorIndex for FileVectorIndex {
    fn insert(&self, document_id: &str, batch: &[NewVector]) -> Result<()> {
        if batch.is_empty() { return Ok(()); }
        self.mutate(|vectors| {
            validate_batch(document_id, batch, uniform_dimension(vectors))?;
            vectors.extend(batch.iter().cloned().map(|v| IndexedVector::new(document_id, v)));
            Ok(((), true))
        })?;
        tracing::debug!(document_id, inserted = batch.len(), "inserted vectors");
        Ok(())
    }

    fn delete_by_document(&self, document_id: &str) -> Result<usize> {
        let removed = self.mutate(|vectors| {
            let removed = remove_document(vectors, document_id);
            Ok((removed, removed > 0))
        })?;
        tracing::debug!(document_id, removed, "deleted document vectors");
        Ok(removed)
    }

    fn replace_document(&self, document_id: &str, batch: &[NewVector]) -> Result<usize> {
        let removed = self.mutate(|vectors| {
            let removed = remove_document(vectors, document_id);
            validate_batch(document_id, batch, uniform_dimension(vectors))?;
            vectors.extend(batch.iter().cloned().map(|v| IndexedVector::new(document_id, v)));
            Ok((removed, removed > 0 || !batch.is_empty()))
        })?;
        tracing::debug!(document_id, removed, inserted = batch.len(), "replaced document vectors");
        Ok(removed)
    }

    fn get_by_document(&self, document_id: &str) -> Result<Vec<IndexedVector>> {
        Ok(self.load()?.into_iter().filter(|v| v.document_id == document_id).collect())
    }

    fn get_all(&self) -> Result<Vec<IndexedVector>> { self.load() }

    fn documents(&self) -> Result<Vec<DocumentSummary>> { Ok(summarize(&self.load()?)) }

    fn dimension(&self) -> Result<Option<usize>> { Ok(uniform_dimension(&self.load()?)) }
}
