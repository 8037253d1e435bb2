//! Domain types shared by the chunker, the index backends and the retriever.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type DocumentId = String;

/// A contiguous span of a source document.
///
/// `position` is the zero-based order of the chunk inside its document and is
/// assigned by the chunker; positions of one document form `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: DocumentId,
    pub position: usize,
    pub text: String,
}

/// One embedded chunk handed to an index, before it is bound to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVector {
    pub text: String,
    pub embedding: Vec<f32>,
    pub position: usize,
}

impl NewVector {
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { text: chunk.text, embedding, position: chunk.position }
    }
}

/// A stored chunk together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    pub document_id: DocumentId,
    pub position: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl IndexedVector {
    pub fn new(document_id: &str, vector: NewVector) -> Self {
        Self {
            document_id: document_id.to_string(),
            position: vector.position,
            text: vector.text,
            embedding: vector.embedding,
        }
    }

    pub fn dimension(&self) -> usize { self.embedding.len() }
}

/// Read-only projection returned by the retriever. Higher `score` is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub document_id: DocumentId,
    pub position: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: DocumentId,
    pub chunk_count: usize,
    /// `None` when the document's vectors disagree on length (legacy stores).
    pub dimension: Option<usize>,
}

/// A chunk that the embedding provider could not embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub position: usize,
    pub reason: String,
}

/// Result of ingesting one document. Failed chunks are reported, not fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: DocumentId,
    pub chunk_count: usize,
    pub inserted_count: usize,
    /// Vectors of the previous version of the document that were replaced.
    pub replaced_count: usize,
    pub failures: Vec<ChunkFailure>,
}

impl IngestReport {
    pub fn skipped_count(&self) -> usize { self.failures.len() }

    pub fn is_partial(&self) -> bool { !self.failures.is_empty() }
}

/// Group `vectors` by document in first-seen order.
pub fn summarize(vectors: &[IndexedVector]) -> Vec<DocumentSummary> {
    let mut out: Vec<DocumentSummary> = Vec::new();
    for v in vectors {
        match out.iter_mut().find(|s| s.document_id == v.document_id) {
            Some(summary) => {
                summary.chunk_count += 1;
                if summary.dimension != Some(v.dimension()) { summary.dimension = None; }
            }
            None => out.push(DocumentSummary {
                document_id: v.document_id.clone(),
                chunk_count: 1,
                dimension: Some(v.dimension()),
            }),
        }
    }
    out
}

/// The shared embedding length of `vectors`, or `None` if empty or mixed.
pub fn uniform_dimension(vectors: &[IndexedVector]) -> Option<usize> {
    let first = vectors.first()?.dimension();
    vectors.iter().all(|v| v.dimension() == first).then_some(first)
}

/// Validate a batch before it is written to an index.
///
/// Every embedding must be non-empty, finite and of one length. When the
/// index already has a uniform dimension the batch has to match it. Returns
/// the batch dimension (`None` for an empty batch).
pub fn validate_batch(
    document_id: &str,
    vectors: &[NewVector],
    index_dimension: Option<usize>,
) -> Result<Option<usize>> {
    let Some(first) = vectors.first() else { return Ok(None) };
    let dim = index_dimension.unwrap_or(first.embedding.len());
    for v in vectors {
        if v.embedding.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty embedding for {document_id}#{}",
                v.position
            )));
        }
        if v.embedding.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "non-finite embedding value for {document_id}#{}",
                v.position
            )));
        }
        if v.embedding.len() != dim {
            return Err(Error::dimension_mismatch(
                dim,
                v.embedding.len(),
                format!("insert of {document_id}#{}", v.position),
            ));
        }
    }
    Ok(Some(dim))
}
