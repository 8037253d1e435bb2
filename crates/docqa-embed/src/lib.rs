//! Embedding providers.
//!
//! Model invocation lives outside this workspace; the only provider shipped
//! here is a deterministic feature-hashing embedder that needs no model files.
//! It is good enough for lexical-overlap retrieval, tests and local demos.

use anyhow::{anyhow, Result};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

pub use docqa_core::traits::Embedder;
use docqa_core::config::EmbeddingConfig;

pub struct HashEmbedder { dim: usize, id: String }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:xxh64:d{}", dim) }
    }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    /// Hashes lowercased whitespace tokens and their character bigrams into
    /// `dim` buckets, then L2-normalizes. Bigrams give scripts without spaces
    /// some partial-match signal.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        if self.dim == 0 { return Err(anyhow!("embedding dimension must be > 0")); }
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.to_lowercase();
            self.bump(&mut v, &token, 1.0 + (i as f32 % 3.0) * 0.01);
            let chars: Vec<char> = token.chars().collect();
            for pair in chars.windows(2) {
                let bigram: String = pair.iter().collect();
                self.bump(&mut v, &bigram, 0.5);
            }
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

impl HashEmbedder {
    fn bump(&self, v: &mut [f32], feature: &str, weight: f32) {
        let mut hasher = XxHash64::with_seed(0);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h as usize) % self.dim;
        let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        v[idx] += weight * (0.5 + val);
    }
}

/// Build the embedder named by `embedding.provider`.
pub fn default_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "hash" => {
            tracing::debug!(dim = config.dimension, "using hash embedder");
            Ok(Box::new(HashEmbedder::new(config.dimension)))
        }
        other => Err(anyhow!("Unknown embedding provider '{}'", other)),
    }
}
