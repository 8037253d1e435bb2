//! Document ingestion: chunk, embed each chunk, replace the document's
//! vectors in one step.

use docqa_core::chunker::Chunker;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, VectorIndex};
use docqa_core::types::{ChunkFailure, IngestReport, NewVector};

pub struct Ingestor<VI> where VI: VectorIndex {
    index: VI,
    embedder: Box<dyn Embedder>,
    chunker: Chunker,
}

impl<VI> Ingestor<VI> where VI: VectorIndex {
    pub fn new(index: VI, embedder: Box<dyn Embedder>, chunker: Chunker) -> Self { Self { index, embedder, chunker } }

    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }

    pub fn ingest_document(&self, document_id: &str, raw_text: &str) -> Result<IngestReport> {
        self.ingest_document_with(document_id, raw_text, |_, _| {})
    }

    /// Like [`Ingestor::ingest_document`], calling `on_chunk(done, total)`
    /// after each embedding attempt.
    ///
    /// Chunks that fail to embed are recorded in the report and the rest keep
    /// their original positions. Nothing is written when the text yields no
    /// chunks or no chunk could be embedded.
    pub fn ingest_document_with(
        &self,
        document_id: &str,
        raw_text: &str,
        mut on_chunk: impl FnMut(usize, usize),
    ) -> Result<IngestReport> {
        let chunks = self.chunker.chunk_document(document_id, raw_text);
        if chunks.is_empty() {
            return Err(Error::EmptyInput { document_id: document_id.to_string() });
        }

        let total = chunks.len();
        let mut vectors = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (done, chunk) in chunks.into_iter().enumerate() {
            match self.embed_chunk(&chunk.text) {
                Ok(embedding) => vectors.push(NewVector::from_chunk(chunk, embedding)),
                Err(e) => {
                    tracing::warn!(document_id, position = chunk.position, error = %e, "skipping chunk that failed to embed");
                    failures.push(ChunkFailure { position: chunk.position, reason: e.to_string() });
                }
            }
            on_chunk(done + 1, total);
        }

        if vectors.is_empty() {
            return Err(Error::NothingEmbedded { document_id: document_id.to_string(), attempted: total, failures });
        }

        let replaced_count = self.index.replace_document(document_id, &vectors)?;
        let report = IngestReport {
            document_id: document_id.to_string(),
            chunk_count: total,
            inserted_count: vectors.len(),
            replaced_count,
            failures,
        };
        tracing::info!(
            document_id,
            embedder = self.embedder.embedder_id(),
            chunks = report.chunk_count,
            inserted = report.inserted_count,
            skipped = report.skipped_count(),
            replaced = report.replaced_count,
            "ingested document"
        );
        Ok(report)
    }

    fn embed_chunk(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let embedding = self.embedder.embed_text(text)?;
        anyhow::ensure!(
            embedding.len() == self.embedder.dim(),
            "embedder returned {} values, expected {}",
            embedding.len(),
            self.embedder.dim()
        );
        Ok(embedding)
    }
}
