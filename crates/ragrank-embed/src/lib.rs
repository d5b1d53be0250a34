//! Embedding providers.
//!
//! The engine treats embedding generation as an external collaborator. This
//! crate ships a deterministic feature-hashing provider for offline use, tests
//! and demos, plus a backfill helper that embeds every chunk of a store.
use anyhow::Result;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::hash::{Hash, Hasher};
use tracing::{debug, info};
use twox_hash::XxHash64;

use ragrank_core::store::InMemoryChunkStore;
use ragrank_core::traits::{ChunkStore, EmbeddingProvider};
use ragrank_core::types::Embedding;

pub const DEFAULT_DIM: usize = 384;

/// Hashes lowercase word tokens into a fixed number of buckets and
/// L2-normalizes the result. Texts sharing words get positive cosine.
pub struct HashingEmbedder { dim: usize, id: String }

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hashing:xxh64:d{dim}") }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign * (0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32) * 0.5);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self { Self::new(DEFAULT_DIM) }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(Embedding::new(self.embed_text(text), self.id.clone()))
    }
}

/// Embed every chunk that has no embedding yet. Returns how many were added.
pub async fn backfill(provider: &dyn EmbeddingProvider, store: &mut InMemoryChunkStore) -> Result<usize> {
    let missing: Vec<(String, String)> = store
        .list_chunks()
        .iter()
        .filter(|c| store.embedding(&c.id).is_none())
        .map(|c| (c.id.clone(), c.content.clone()))
        .collect();
    debug!(missing = missing.len(), model = provider.model_id(), "backfilling chunk embeddings");
    let embeddings = try_join_all(missing.iter().map(|(_, content)| provider.embed(content))).await?;
    for ((id, _), embedding) in missing.iter().zip(embeddings) {
        store.insert_embedding(id, embedding)?;
    }
    if !missing.is_empty() {
        info!(added = missing.len(), model = provider.model_id(), "chunk embeddings backfilled");
    }
    Ok(missing.len())
}

/// Provider used when nothing else is configured.
pub fn get_default_provider() -> std::sync::Arc<dyn EmbeddingProvider> {
    std::sync::Arc::new(HashingEmbedder::default())
}
