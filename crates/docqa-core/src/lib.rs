//! docqa-core
//!
//! Types, traits, chunking and configuration shared by the index backends,
//! the retriever and the CLI.

pub mod chunker;
pub mod config;
pub mod documents;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{split_text, Chunker, ChunkingConfig};
pub use error::{Error, Result};
pub use traits::{Embedder, VectorIndex};
pub use types::{Chunk, ChunkFailure, DocumentSummary, IndexedVector, IngestReport, NewVector, SearchResult};
