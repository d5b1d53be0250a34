//! Domain types shared by the scorers, the reranker and the search engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ChunkId = String;

/// A segment of a source document produced by an external chunker.
///
/// - `id`: stable chunk identifier
/// - `content`: the text payload
/// - `start_index`/`end_index`: char span of the chunk in its source document
/// - `word_count`/`char_count`/`sentence_count`: size metadata
/// - `strategy`: tag of the segmentation strategy that produced the chunk
/// - `parent_id`: parent chunk when produced by hierarchical chunking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: ChunkId,
    pub content: String,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub char_count: usize,
    #[serde(default)]
    pub sentence_count: usize,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChunkId>,
}

fn default_strategy() -> String {
    "unknown".to_string()
}

impl Chunk {
    /// Build a chunk spanning its whole content, deriving the size counters.
    pub fn new(id: impl Into<ChunkId>, content: impl Into<String>, strategy: impl Into<String>) -> Self {
        let content = content.into();
        let char_count = content.chars().count();
        Self {
            id: id.into(),
            word_count: content.split_whitespace().count(),
            sentence_count: count_sentences(&content),
            start_index: 0,
            end_index: char_count,
            char_count,
            content,
            strategy: strategy.into(),
            parent_id: None,
        }
    }

    /// Word count, recomputed when the stored counter was left at zero
    /// by a chunk file that omitted it.
    pub fn words(&self) -> usize {
        if self.word_count == 0 {
            self.content.split_whitespace().count()
        } else {
            self.word_count
        }
    }
}

fn count_sentences(text: &str) -> usize {
    text.split(&['.', '!', '?'][..])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// A dense vector attached to one chunk or to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    #[serde(default)]
    pub model: String,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        Self { vector, model: model.into() }
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Keyword,
    Semantic,
    Hybrid,
}

impl SearchMode {
    pub fn needs_embeddings(self) -> bool {
        matches!(self, Self::Semantic | Self::Hybrid)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SearchMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(Self::Keyword),
            "semantic" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(crate::Error::Validation(format!("unknown search mode '{other}'"))),
        }
    }
}

/// Second-pass strategy applied to the first-stage candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankMethod {
    #[default]
    None,
    Bm25,
    CrossEncoder,
    Diversity,
    LengthPenalty,
    KeywordBoost,
}

impl RerankMethod {
    /// Key of the sub-score recorded by this strategy, if any.
    pub fn score_key(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Bm25 => Some("bm25_score"),
            Self::CrossEncoder => Some("cross_encoder_score"),
            Self::Diversity => Some("diversity_score"),
            Self::LengthPenalty => Some("length_score"),
            Self::KeywordBoost => Some("keyword_score"),
        }
    }
}

impl fmt::Display for RerankMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Bm25 => "bm25",
            Self::CrossEncoder => "cross_encoder",
            Self::Diversity => "diversity",
            Self::LengthPenalty => "length_penalty",
            Self::KeywordBoost => "keyword_boost",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RerankMethod {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "bm25" => Ok(Self::Bm25),
            "cross_encoder" => Ok(Self::CrossEncoder),
            "diversity" => Ok(Self::Diversity),
            "length_penalty" => Ok(Self::LengthPenalty),
            "keyword_boost" => Ok(Self::KeywordBoost),
            other => Err(crate::Error::Validation(format!("unknown reranking method '{other}'"))),
        }
    }
}

/// Parameters of a single search call.
///
/// `keyword_weight` and `semantic_weight` must be given together; when both
/// are absent the engine falls back to its configured hybrid weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
    pub mode: SearchMode,
    pub result_limit: usize,
    pub similarity_threshold: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_weight: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_weight: Option<f32>,
    #[serde(default = "default_true")]
    pub enable_highlighting: bool,
    #[serde(default)]
    pub reranking_method: RerankMethod,
}

fn default_true() -> bool {
    true
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            mode: SearchMode::Hybrid,
            result_limit: 5,
            similarity_threshold: 0.0,
            keyword_weight: None,
            semantic_weight: None,
            enable_highlighting: true,
            reranking_method: RerankMethod::None,
        }
    }
}

/// Which signal produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Keyword,
    Semantic,
    Hybrid,
}

/// First-stage scoring of one chunk.
///
/// `index` is the chunk's position in the store snapshot and is the
/// tie-breaker for equal scores.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub index: usize,
    pub chunk: &'a Chunk,
    pub lexical_score: f32,
    pub semantic_score: Option<f32>,
    pub combined_score: f32,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Exact,
    Partial,
    Semantic,
}

/// A byte range of chunk content marking a match. Offsets always fall on
/// char boundaries and satisfy `start < end <= content.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHighlight {
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: HighlightKind,
}

/// One entry of the final result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub chunk_id: ChunkId,
    pub content: String,
    pub score: f32,
    pub match_type: MatchType,
    pub initial_rank: usize,
    pub final_rank: usize,
    pub rerank_scores: BTreeMap<String, f32>,
    pub highlights: Vec<TextHighlight>,
    pub lexical_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetrics {
    pub total_chunks: usize,
    pub candidates_scored: usize,
    pub retrieved_chunks: usize,
    pub avg_score: f32,
    pub mode: SearchMode,
    pub reranking_method: RerankMethod,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<RankedResult>,
    pub warnings: Vec<String>,
    pub metrics: SearchMetrics,
}

impl SearchResponse {
    pub fn empty(total_chunks: usize, params: &SearchParameters, warning: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            warnings: vec![warning.into()],
            metrics: SearchMetrics {
                total_chunks,
                candidates_scored: 0,
                retrieved_chunks: 0,
                avg_score: 0.0,
                mode: params.mode,
                reranking_method: params.reranking_method,
                elapsed_ms: 0,
            },
        }
    }
}

/// Transport-level request: the query plus its parameters, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(flatten)]
    pub params: SearchParameters,
}
