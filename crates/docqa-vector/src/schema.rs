//! Persisted record layouts.
//!
//! `SCHEMA_VERSION` is written into every store. Version 0 is the bare JSON
//! array `[{text, embedding, fileName, chunkIndex}]` written by the earlier
//! web service; it is read transparently and upgraded on the next write.

use serde::{Deserialize, Serialize};

use docqa_core::types::IndexedVector;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct StoreFileRef<'a> {
    pub schema_version: u32,
    /// Shared embedding length, `null` when empty or mixed.
    pub dimension: Option<usize>,
    pub vectors: &'a [IndexedVector],
}

#[derive(Debug, Deserialize)]
pub struct StoreFile {
    pub schema_version: u32,
    pub dimension: Option<usize>,
    pub vectors: Vec<IndexedVector>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyVector {
    pub text: String,
    pub embedding: Vec<f32>,
    pub file_name: String,
    pub chunk_index: usize,
}

impl From<LegacyVector> for IndexedVector {
    fn from(v: LegacyVector) -> Self {
        IndexedVector { document_id: v.file_name, position: v.chunk_index, text: v.text, embedding: v.embedding }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OnDisk {
    Versioned(StoreFile),
    Legacy(Vec<LegacyVector>),
}

#[cfg(feature = "lance")]
pub use arrow::*;

#[cfg(feature = "lance")]
mod arrow {
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("doc_id", DataType::Utf8, false),
            Field::new("position", DataType::Int32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("seq", DataType::Int64, false),
            Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
        ]))
    }

    /// Dimension encoded in the `vector` column of `schema`.
    pub fn vector_dimension(schema: &Schema) -> Option<usize> {
        match schema.field_with_name("vector").ok()?.data_type() {
            DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
            _ => None,
        }
    }
}
