//! Ingestion and retrieval on top of a `VectorIndex`.

pub mod ingest;
pub mod outcome;
pub mod retriever;
pub mod similarity;

pub use ingest::Ingestor;
pub use outcome::{DeleteOutcome, IngestOutcome, QueryOutcome};
pub use retriever::{grounding_context, Retriever, SearchReport};
pub use similarity::cosine_similarity;
