//! Wiring for the `docqa` binary: config → index + embedder → outcomes.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docqa_core::chunker::Chunker;
use docqa_core::config::{Config, LoggingConfig, Settings};
use docqa_core::documents::{collect_text_files, document_id_for, read_document};
use docqa_core::{DocumentSummary, VectorIndex};
use docqa_embed::default_embedder;
use docqa_retrieval::{DeleteOutcome, IngestOutcome, Ingestor, QueryOutcome, Retriever};
use docqa_vector::open_index;

type SharedIndex = Arc<dyn VectorIndex>;

/// Install the global subscriber. `RUST_LOG` wins over `logging.filter`.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);
    if config.json { builder.json().init() } else { builder.init() }
}

/// Load the layered config from `dir`. Errors carry the directory once.
pub fn load_config(dir: &Path) -> Result<Config> {
    Config::load_from(dir).with_context(|| format!("Error loading config from {}", dir.display()))
}

pub struct App {
    settings: Settings,
    ingestor: Ingestor<SharedIndex>,
    retriever: Retriever<SharedIndex>,
    show_progress: bool,
}

impl App {
    pub fn open(config: &Config) -> Result<Self> {
        let settings = config.settings()?;
        let index: SharedIndex = Arc::from(open_index(&settings.index, config.base_dir())?);
        let embedder = default_embedder(&settings.embedding)?;
        let chunker = Chunker::new(settings.chunking.clone());
        tracing::debug!(
            backend = ?settings.index.backend,
            path = %settings.index.resolved_path(config.base_dir()).display(),
            embedder = embedder.embedder_id(),
            "opened index"
        );
        Ok(Self {
            ingestor: Ingestor::new(Arc::clone(&index), embedder, chunker),
            retriever: Retriever::with_policy(index, settings.retrieval.on_dimension_mismatch),
            settings,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    /// Ingest every text file under `paths`, one outcome per file.
    pub fn ingest(&self, paths: &[PathBuf]) -> Result<Vec<IngestOutcome>> {
        let files = collect_text_files(paths)?;
        tracing::info!(files = files.len(), "ingesting");
        let mut outcomes = Vec::with_capacity(files.len());
        for path in &files {
            let document_id = document_id_for(path);
            let doc = match read_document(path) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read document");
                    outcomes.push(IngestOutcome::failed(&document_id, format!("{e:#}")));
                    continue;
                }
            };
            let pb = self.progress_bar()?;
            pb.set_message(doc.document_id.clone());
            let result = self.ingestor.ingest_document_with(&doc.document_id, &doc.text, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            });
            pb.finish_and_clear();
            outcomes.push(IngestOutcome::from_result(&doc.document_id, result));
        }
        Ok(outcomes)
    }

    /// Embed `text` and rank the index against it. `k` defaults to `retrieval.top_k`.
    pub fn query(&self, text: &str, scope: Option<&str>, k: Option<usize>) -> QueryOutcome {
        let k = k.unwrap_or(self.settings.retrieval.top_k);
        match self.ingestor.embedder().embed_text(text) {
            Ok(embedding) => QueryOutcome::from_result(self.retriever.search_report(&embedding, scope, k)),
            Err(e) => QueryOutcome::failed(format!("Failed to embed query: {e:#}")),
        }
    }

    pub fn delete(&self, document_id: &str) -> DeleteOutcome {
        DeleteOutcome::from_result(document_id, self.retriever.index().delete_by_document(document_id))
    }

    pub fn list(&self) -> Result<Vec<DocumentSummary>> { Ok(self.retriever.index().documents()?) }

    fn progress_bar(&self) -> Result<ProgressBar> {
        if !self.show_progress { return Ok(ProgressBar::hidden()); }
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}")?
                .progress_chars("#>-"),
        );
        Ok(pb)
    }
}
