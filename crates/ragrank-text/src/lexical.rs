//! Term statistics and lexical scoring.
//!
//! A `Corpus` is built once per search from the chunk snapshot. It is not an
//! index: nothing is persisted and it is dropped with the search.
//!
//! TF-IDF (first-stage keyword score):
//!
//! ```text
//! idf(t)   = ln((1 + N) / (1 + df(t))) + 1
//! w(t, D)  = count(t, D) / |D| * idf(t)
//! score(D) = sum over query terms of w(t, D), divided by the max over all D
//! ```
//!
//! BM25 (used by the `bm25` reranking strategy):
//!
//! ```text
//! idf(t)   = ln((N - n(t) + 0.5) / (n(t) + 0.5) + 1)
//! score(D) = sum idf(t) * f(t,D)*(k1+1) / (f(t,D) + k1*(1 - b + b*|D|/avgdl))
//! ```
use std::collections::{HashMap, HashSet};

use ragrank_core::types::Chunk;
use tracing::debug;

use crate::tokenizer::{Token, Tokenizer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
	pub k1: f32,
	pub b: f32,
}

impl Default for Bm25Params {
	fn default() -> Self { Self { k1: 1.5, b: 0.75 } }
}

/// Tokens and term frequencies of one chunk.
#[derive(Debug, Clone)]
pub struct DocStats {
	pub tokens: Vec<Token>,
	term_freq: HashMap<String, usize>,
}

impl DocStats {
	fn new(tokens: Vec<Token>) -> Self {
		let mut term_freq = HashMap::new();
		for t in &tokens { *term_freq.entry(t.text.clone()).or_insert(0) += 1; }
		Self { tokens, term_freq }
	}

	pub fn len(&self) -> usize { self.tokens.len() }

	pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

	pub fn tf(&self, term: &str) -> usize { self.term_freq.get(term).copied().unwrap_or(0) }

	pub fn contains(&self, term: &str) -> bool { self.term_freq.contains_key(term) }

	pub fn term_set(&self) -> HashSet<&str> { self.term_freq.keys().map(String::as_str).collect() }
}

pub struct Corpus {
	docs: Vec<DocStats>,
	doc_freq: HashMap<String, usize>,
	avg_doc_len: f32,
}

impl Corpus {
	pub fn build(tokenizer: &Tokenizer, chunks: &[Chunk]) -> Self {
		let docs: Vec<DocStats> = chunks.iter().map(|c| DocStats::new(tokenizer.tokenize(&c.content))).collect();
		let mut doc_freq: HashMap<String, usize> = HashMap::new();
		for d in &docs {
			for term in d.term_freq.keys() { *doc_freq.entry(term.clone()).or_insert(0) += 1; }
		}
		let total: usize = docs.iter().map(DocStats::len).sum();
		let avg_doc_len = if docs.is_empty() { 0.0 } else { total as f32 / docs.len() as f32 };
		debug!(docs = docs.len(), vocabulary = doc_freq.len(), avg_doc_len, "built lexical corpus");
		Self { docs, doc_freq, avg_doc_len }
	}

	pub fn len(&self) -> usize { self.docs.len() }

	pub fn is_empty(&self) -> bool { self.docs.is_empty() }

	pub fn doc(&self, index: usize) -> &DocStats { &self.docs[index] }

	pub fn avg_doc_len(&self) -> f32 { self.avg_doc_len }

	pub fn doc_freq(&self, term: &str) -> usize { self.doc_freq.get(term).copied().unwrap_or(0) }

	/// Normalized TF-IDF score per chunk, in chunk order. The best chunk scores
	/// 1.0; all zeros when no chunk contains a query term.
	pub fn tfidf_scores(&self, query_terms: &[String]) -> Vec<f32> {
		let n = self.docs.len() as f32;
		let raw: Vec<f32> = self.docs.iter().map(|d| {
			if d.is_empty() { return 0.0; }
			query_terms.iter().filter(|t| d.contains(t)).map(|t| {
				let idf = ((1.0 + n) / (1.0 + self.doc_freq(t) as f32)).ln() + 1.0;
				d.tf(t) as f32 / d.len() as f32 * idf
			}).sum()
		}).collect();
		normalize_by_max(raw)
	}

	/// Raw BM25 score of one chunk.
	pub fn bm25_score(&self, index: usize, query_terms: &[String], params: Bm25Params) -> f32 {
		let d = &self.docs[index];
		let n = self.docs.len() as f32;
		let len_ratio = if self.avg_doc_len > 0.0 { d.len() as f32 / self.avg_doc_len } else { 1.0 };
		query_terms.iter().map(|t| {
			let tf = d.tf(t) as f32;
			if tf == 0.0 { return 0.0; }
			let df = self.doc_freq(t) as f32;
			let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
			idf * tf * (params.k1 + 1.0) / (tf + params.k1 * (1.0 - params.b + params.b * len_ratio))
		}).sum()
	}

	pub fn bm25_scores(&self, query_terms: &[String], params: Bm25Params) -> Vec<f32> {
		(0..self.docs.len()).map(|i| self.bm25_score(i, query_terms, params)).collect()
	}
}

/// Divide by the maximum so the top value is 1.0; all zeros stay zeros.
pub fn normalize_by_max(scores: Vec<f32>) -> Vec<f32> {
	let max = scores.iter().copied().fold(0.0f32, f32::max);
	if max <= 0.0 { return vec![0.0; scores.len()]; }
	scores.into_iter().map(|s| s / max).collect()
}

/// `score(query, chunks)` for callers that do not keep a corpus around.
pub struct LexicalScorer {
	tokenizer: Tokenizer,
}

impl LexicalScorer {
	pub fn new(tokenizer: Tokenizer) -> Self { Self { tokenizer } }

	pub fn score(&self, query: &str, chunks: &[Chunk]) -> Vec<f32> {
		if chunks.is_empty() { return Vec::new(); }
		let corpus = Corpus::build(&self.tokenizer, chunks);
		corpus.tfidf_scores(&self.tokenizer.query_terms(query))
	}
}
