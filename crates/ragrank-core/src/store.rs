//! In-memory chunk snapshot.
//!
//! Chunk files are JSON documents of the form
//! `{ "chunks": [ ... ], "embeddings": { "<chunk id>": { "vector": [...], "model": "..." } } }`
//! where `embeddings` may be omitted or cover only some chunks.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::ChunkStore;
use crate::types::{Chunk, ChunkId, Embedding};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryChunkStore {
    chunks: Vec<Chunk>,
    #[serde(default)]
    embeddings: HashMap<ChunkId, Embedding>,
}

impl InMemoryChunkStore {
    /// Build a store from chunks in their original order.
    ///
    /// Chunk ids must be unique.
    pub fn new(chunks: Vec<Chunk>) -> Result<Self> {
        let mut seen = HashSet::new();
        for c in &chunks {
            if !seen.insert(c.id.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate chunk id '{}'", c.id)));
            }
        }
        Ok(Self { chunks, embeddings: HashMap::new() })
    }

    /// Attach (or replace) the embedding of an existing chunk.
    pub fn insert_embedding(&mut self, chunk_id: &str, embedding: Embedding) -> Result<()> {
        if !self.chunks.iter().any(|c| c.id == chunk_id) {
            return Err(Error::NotFound(format!("chunk '{chunk_id}'")));
        }
        self.embeddings.insert(chunk_id.to_string(), embedding);
        Ok(())
    }

    pub fn with_embedding(mut self, chunk_id: &str, embedding: Embedding) -> Result<Self> {
        self.insert_embedding(chunk_id, embedding)?;
        Ok(self)
    }

    pub fn embedded_count(&self) -> usize {
        self.embeddings.len()
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let raw: Self = serde_json::from_str(json).context("parsing chunk file")?;
        let mut store = Self::new(raw.chunks)?;
        for (id, embedding) in raw.embeddings {
            store.insert_embedding(&id, embedding)?;
        }
        Ok(store)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading chunk file {}", path.display()))?;
        Self::from_json_str(&json)
    }
}

impl ChunkStore for InMemoryChunkStore {
    fn list_chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn embedding(&self, chunk_id: &str) -> Option<&Embedding> {
        self.embeddings.get(chunk_id)
    }
}
