use serde::{Deserialize, Serialize};
use tracing::warn;

use ragrank_core::error::{Error, Result};
use ragrank_core::traits::ChunkStore;
use ragrank_core::types::{ChunkId, Embedding};

/// Raw cosine similarity in [-1, 1]. Zero-norm vectors yield 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
	if a.len() != b.len() {
		return Err(Error::DimensionMismatch { expected: a.len(), actual: b.len() });
	}
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
	if norm_a == 0.0 || norm_b == 0.0 { return Ok(0.0); }
	Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Percentage shown to users: negative similarity reads as 0%.
pub fn similarity_percent(sim: f32) -> f32 { sim.max(0.0) * 100.0 }

#[derive(Debug, Default)]
pub struct SemanticScores {
	/// Per chunk, in store order; `None` when the chunk has no usable embedding.
	pub scores: Vec<Option<f32>>,
	/// Chunks excluded because their dimensionality differs from the query's.
	pub mismatched: Vec<(ChunkId, Error)>,
}

pub struct SemanticScorer;

impl SemanticScorer {
	/// Score every chunk against the query: raw cosine clamped at 0.
	pub fn score(query: &Embedding, store: &dyn ChunkStore) -> SemanticScores {
		let mut out = SemanticScores::default();
		for chunk in store.list_chunks() {
			let score = match store.embedding(&chunk.id) {
				None => None,
				Some(e) => match cosine_similarity(&query.vector, &e.vector) {
					Ok(sim) => Some(sim.max(0.0)),
					Err(err) => {
						warn!(chunk = %chunk.id, error = %err, "excluding chunk from semantic scoring");
						out.mismatched.push((chunk.id.clone(), err));
						None
					}
				},
			};
			out.scores.push(score);
		}
		out
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarPair {
	pub first: ChunkId,
	pub second: ChunkId,
	pub similarity: f32,
}

/// Pairs of embedded chunks (store order, first < second) whose cosine is at
/// least `threshold`. Pairs with mismatched dimensions are skipped.
pub fn similar_pairs(store: &dyn ChunkStore, threshold: f32) -> Vec<SimilarPair> {
	let embedded: Vec<(&ChunkId, &Embedding)> = store
		.list_chunks()
		.iter()
		.filter_map(|c| store.embedding(&c.id).map(|e| (&c.id, e)))
		.collect();
	let mut pairs = Vec::new();
	for (i, (first, a)) in embedded.iter().enumerate() {
		for (second, b) in &embedded[i + 1..] {
			if let Ok(similarity) = cosine_similarity(&a.vector, &b.vector) {
				if similarity >= threshold {
					pairs.push(SimilarPair { first: (*first).clone(), second: (*second).clone(), similarity });
				}
			}
		}
	}
	pairs
}
