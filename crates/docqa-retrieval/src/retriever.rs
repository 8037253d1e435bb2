//! Brute-force top-k retrieval over a `VectorIndex` snapshot.

use serde::{Deserialize, Serialize};

use docqa_core::config::MismatchPolicy;
use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorIndex;
use docqa_core::types::SearchResult;

use crate::similarity::cosine_similarity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub results: Vec<SearchResult>,
    /// Candidates dropped because their length differed from the query's.
    pub skipped: usize,
}

pub struct Retriever<VI> where VI: VectorIndex {
    index: VI,
    policy: MismatchPolicy,
}

impl<VI> Retriever<VI> where VI: VectorIndex {
    pub fn new(index: VI) -> Self { Self::with_policy(index, MismatchPolicy::Fail) }

    pub fn with_policy(index: VI, policy: MismatchPolicy) -> Self { Self { index, policy } }

    pub fn index(&self) -> &VI { &self.index }

    pub fn search(&self, query: &[f32], scope: Option<&str>, k: usize) -> Result<Vec<SearchResult>> {
        Ok(self.search_report(query, scope, k)?.results)
    }

    /// Score every candidate in `scope` (or the whole index) and keep the best
    /// `k`, highest first. Equal scores keep index order.
    pub fn search_report(&self, query: &[f32], scope: Option<&str>, k: usize) -> Result<SearchReport> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be > 0".into()));
        }
        if query.is_empty() || query.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument("query embedding must be non-empty and finite".into()));
        }

        let candidates = match scope {
            Some(document_id) => self.index.get_by_document(document_id)?,
            None => self.index.get_all()?,
        };

        let mut skipped = 0usize;
        let mut scored: Vec<SearchResult> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.dimension() != query.len() {
                match self.policy {
                    MismatchPolicy::Fail => {
                        return Err(Error::dimension_mismatch(
                            query.len(),
                            candidate.dimension(),
                            format!("candidate {}#{}", candidate.document_id, candidate.position),
                        ));
                    }
                    MismatchPolicy::Skip => {
                        tracing::warn!(
                            document_id = %candidate.document_id,
                            position = candidate.position,
                            expected = query.len(),
                            actual = candidate.dimension(),
                            "skipping candidate with mismatched dimension"
                        );
                        skipped += 1;
                        continue;
                    }
                }
            }
            let score = cosine_similarity(query, &candidate.embedding)?;
            scored.push(SearchResult {
                text: candidate.text,
                document_id: candidate.document_id,
                position: candidate.position,
                score,
            });
        }

        // sort_by is stable
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        tracing::debug!(scope = scope.unwrap_or("*"), k, returned = scored.len(), skipped, "search complete");
        Ok(SearchReport { results: scored, skipped })
    }
}

/// Result texts in rank order, separated by a blank line.
pub fn grounding_context(results: &[SearchResult]) -> String {
    results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join("\n\n")
}
