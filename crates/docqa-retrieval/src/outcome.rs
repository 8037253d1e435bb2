//! Structured outcomes for serving layers: a success flag, a human-readable
//! message and whatever counts are known, never a raw error.

use serde::{Deserialize, Serialize};

use docqa_core::error::{Error, Result};
use docqa_core::types::{ChunkFailure, IngestReport, SearchResult};

use crate::retriever::SearchReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub success: bool,
    pub message: String,
    pub document_id: String,
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub replaced_count: usize,
    pub failures: Vec<ChunkFailure>,
}

impl IngestOutcome {
    pub fn from_result(document_id: &str, result: Result<IngestReport>) -> Self {
        match result {
            Ok(report) => {
                let message = if report.is_partial() {
                    format!(
                        "Indexed {} of {} chunks; {} failed to embed",
                        report.inserted_count,
                        report.chunk_count,
                        report.skipped_count()
                    )
                } else {
                    format!("Indexed {} chunks", report.inserted_count)
                };
                Self {
                    success: true,
                    message,
                    document_id: report.document_id.clone(),
                    inserted_count: report.inserted_count,
                    skipped_count: report.skipped_count(),
                    replaced_count: report.replaced_count,
                    failures: report.failures,
                }
            }
            Err(Error::NothingEmbedded { document_id, attempted, failures }) => Self {
                success: false,
                message: format!("None of the {} chunks could be embedded", attempted),
                document_id,
                inserted_count: 0,
                skipped_count: attempted,
                replaced_count: 0,
                failures,
            },
            Err(e) => Self::failed(document_id, e.to_string()),
        }
    }

    /// A failure that happened before ingestion started, e.g. an unreadable file.
    pub fn failed(document_id: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            document_id: document_id.to_string(),
            inserted_count: 0,
            skipped_count: 0,
            replaced_count: 0,
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub success: bool,
    pub message: String,
    pub results: Vec<SearchResult>,
    pub skipped: usize,
}

impl QueryOutcome {
    pub fn from_result(result: Result<SearchReport>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                message: format!("{} results", report.results.len()),
                results: report.results,
                skipped: report.skipped,
            },
            Err(e) => Self::failed(e.to_string()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), results: Vec::new(), skipped: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    pub document_id: String,
    pub removed_count: usize,
}

impl DeleteOutcome {
    pub fn from_result(document_id: &str, result: Result<usize>) -> Self {
        match result {
            Ok(removed_count) => Self {
                success: true,
                message: format!("Removed {} vectors", removed_count),
                document_id: document_id.to_string(),
                removed_count,
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                document_id: document_id.to_string(),
                removed_count: 0,
            },
        }
    }
}
