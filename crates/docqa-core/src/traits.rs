use std::sync::Arc;

use crate::error::Result;
use crate::types::{DocumentSummary, IndexedVector, NewVector};

/// External embedding provider. One call per text; a failure only affects
/// that text.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hash:xxh64:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Durable collection of embedded chunks for one deployment.
///
/// Reads always observe the latest persisted state and return vectors in
/// insertion order. A document id with no vectors is not an error: reads
/// return an empty list and deletes remove nothing.
pub trait VectorIndex: Send + Sync {
    /// Append a batch of vectors belonging to `document_id`.
    fn insert(&self, document_id: &str, vectors: &[NewVector]) -> Result<()>;

    /// Remove every vector of `document_id`; returns how many were removed.
    fn delete_by_document(&self, document_id: &str) -> Result<usize>;

    /// Delete the document's vectors and insert `vectors` as one atomic unit.
    /// Returns how many old vectors were removed.
    fn replace_document(&self, document_id: &str, vectors: &[NewVector]) -> Result<usize>;

    fn get_by_document(&self, document_id: &str) -> Result<Vec<IndexedVector>>;

    fn get_all(&self) -> Result<Vec<IndexedVector>>;

    fn documents(&self) -> Result<Vec<DocumentSummary>>;

    /// Embedding length new batches must match, if any. The file backend
    /// derives it from the stored vectors, so an emptied store accepts any
    /// length; a Lance table keeps the length fixed at creation.
    fn dimension(&self) -> Result<Option<usize>>;
}

macro_rules! forward_vector_index {
    ($($wrapper:ty),*) => {$(
        impl<T: VectorIndex + ?Sized> VectorIndex for $wrapper {
            fn insert(&self, document_id: &str, vectors: &[NewVector]) -> Result<()> { (**self).insert(document_id, vectors) }
            fn delete_by_document(&self, document_id: &str) -> Result<usize> { (**self).delete_by_document(document_id) }
            fn replace_document(&self, document_id: &str, vectors: &[NewVector]) -> Result<usize> { (**self).replace_document(document_id, vectors) }
            fn get_by_document(&self, document_id: &str) -> Result<Vec<IndexedVector>> { (**self).get_by_document(document_id) }
            fn get_all(&self) -> Result<Vec<IndexedVector>> { (**self).get_all() }
            fn documents(&self) -> Result<Vec<DocumentSummary>> { (**self).documents() }
            fn dimension(&self) -> Result<Option<usize>> { (**self).dimension() }
        }
    )*};
}

forward_vector_index!(&T, Box<T>, Arc<T>);
