use async_trait::async_trait;

use crate::types::{Chunk, Embedding};

/// Read-only snapshot of segmented chunks and their optional embeddings.
///
/// Implementations must not mutate the snapshot while a search borrows it.
pub trait ChunkStore: Send + Sync {
    fn list_chunks(&self) -> &[Chunk];
    fn embedding(&self, chunk_id: &str) -> Option<&Embedding>;

    fn len(&self) -> usize {
        self.list_chunks().len()
    }

    fn is_empty(&self) -> bool {
        self.list_chunks().is_empty()
    }
}

/// Maps text to a fixed-length vector. Calls may fail or hang; the search
/// engine bounds them with a timeout and degrades to lexical scoring.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `hashing:xxh64:d384`).
    fn model_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> anyhow::Result<Embedding>;
}
