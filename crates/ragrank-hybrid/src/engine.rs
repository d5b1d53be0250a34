//! Search orchestration.
//!
//! One `search` call runs the whole pipeline over a borrowed store snapshot:
//! validate, score lexically, score semantically (when the mode needs it and a
//! query vector can be had), combine, select the candidate pool, rerank,
//! highlight and report. Only invalid parameters fail the call; everything
//! recoverable becomes a warning on the response.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ragrank_core::config::EngineConfig;
use ragrank_core::error::{Error, Result};
use ragrank_core::traits::{ChunkStore, EmbeddingProvider};
use ragrank_core::types::{
    Embedding, RankedResult, RerankMethod, SearchMetrics, SearchMode, SearchParameters, SearchRequest, SearchResponse,
};
use ragrank_text::{extract_highlights, semantic_highlight, Bm25Params, Corpus, Tokenizer};
use ragrank_vector::SemanticScorer;
use tracing::{debug, info, warn};

use crate::combine::{combine, select, Weights};
use crate::rerank::{rerank, RerankContext, RerankItem};

pub const EMPTY_QUERY: &str = "empty query";
pub const NO_CHUNKS_AVAILABLE: &str = "no chunks available";

const WEIGHT_SUM_TOLERANCE: f32 = 1e-6;

pub struct SearchEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl SearchEngine {
    /// Fails with `Error::InvalidConfig` when the settings are out of range.
    pub fn new(config: EngineConfig, provider: Option<Arc<dyn EmbeddingProvider>>) -> Result<Self> {
        config.validate()?;
        let tokenizer = Tokenizer::new(config.lexical.remove_stop_words);
        Ok(Self { config, tokenizer, provider })
    }

    pub async fn search_request(&self, request: &SearchRequest, store: &dyn ChunkStore) -> Result<SearchResponse> {
        self.search(&request.query, store, None, &request.params).await
    }

    /// Rank the store's chunks against `query`.
    ///
    /// `query_embedding` is used as-is when given; otherwise semantic and
    /// hybrid modes ask the provider once, bounded by the configured timeout,
    /// and fall back to keyword mode if that fails.
    pub async fn search(
        &self,
        query: &str,
        store: &dyn ChunkStore,
        query_embedding: Option<&Embedding>,
        params: &SearchParameters,
    ) -> Result<SearchResponse> {
        let started = Instant::now();
        let (weights, mut warnings) = self.resolve_weights(params)?;
        validate_params(params)?;

        if query.trim().is_empty() {
            return Ok(SearchResponse::empty(store.len(), params, EMPTY_QUERY));
        }
        if store.is_empty() {
            return Ok(SearchResponse::empty(0, params, NO_CHUNKS_AVAILABLE));
        }

        let chunks = store.list_chunks();
        let terms = self.tokenizer.query_terms(query);
        let corpus = Corpus::build(&self.tokenizer, chunks);
        let lexical = corpus.tfidf_scores(&terms);

        let mut mode = params.mode;
        let fetched = if mode.needs_embeddings() && query_embedding.is_none() {
            match self.fetch_query_embedding(query).await {
                Ok(embedding) => Some(embedding),
                Err(err) => {
                    warn!(error = %err, requested = %mode, "falling back to keyword search");
                    warnings.push(err.to_string());
                    mode = SearchMode::Keyword;
                    None
                }
            }
        } else {
            None
        };
        let query_vector = if mode.needs_embeddings() { query_embedding.or(fetched.as_ref()) } else { None };

        let semantic = query_vector.map(|q| {
            let scored = SemanticScorer::score(q, store);
            for (id, err) in &scored.mismatched {
                warnings.push(format!("chunk '{id}' excluded from semantic scoring: {err}"));
            }
            scored.scores
        });
        if let (SearchMode::Semantic, Some(scores)) = (mode, semantic.as_ref()) {
            let unembedded = chunks
                .iter()
                .zip(scores)
                .filter(|(c, s)| s.is_none() && store.embedding(&c.id).is_none())
                .count();
            if unembedded > 0 {
                warnings.push(format!("{unembedded} chunks without embeddings excluded from semantic search"));
            }
        }

        let candidates = combine(chunks, &lexical, semantic.as_deref(), mode, weights);
        let candidates_scored = candidates.len();
        let pool = match params.reranking_method {
            RerankMethod::None => params.result_limit,
            _ => params.result_limit.saturating_mul(self.config.rerank.pool_factor),
        };
        let pooled = select(candidates, params.similarity_threshold, pool);
        debug!(scored = candidates_scored, pooled = pooled.len(), mode = %mode, "first stage complete");

        let ctx = RerankContext {
            query_terms: &terms,
            corpus: &corpus,
            store,
            settings: &self.config.rerank,
            bm25: Bm25Params { k1: self.config.lexical.bm25_k1, b: self.config.lexical.bm25_b },
            limit: params.result_limit,
        };
        let ranked = rerank(params.reranking_method, pooled, &ctx, params.similarity_threshold);

        let results: Vec<RankedResult> = ranked
            .into_iter()
            .enumerate()
            .map(|(i, item)| to_result(item, i + 1, &terms, params))
            .collect();

        let avg_score = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32
        };
        let metrics = SearchMetrics {
            total_chunks: chunks.len(),
            candidates_scored,
            retrieved_chunks: results.len(),
            avg_score,
            mode,
            reranking_method: params.reranking_method,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            mode = %mode,
            rerank = %params.reranking_method,
            results = results.len(),
            warnings = warnings.len(),
            elapsed_ms = metrics.elapsed_ms,
            "search complete"
        );
        Ok(SearchResponse { results, warnings, metrics })
    }

    /// Per-call weights, or the configured ones. A sum other than 1 is
    /// normalized and reported.
    fn resolve_weights(&self, params: &SearchParameters) -> Result<(Weights, Vec<String>)> {
        let (keyword, semantic) = match (params.keyword_weight, params.semantic_weight) {
            (Some(k), Some(s)) => (k, s),
            (None, None) => (self.config.hybrid.keyword_weight, self.config.hybrid.semantic_weight),
            _ => {
                return Err(Error::Validation(
                    "keywordWeight and semanticWeight must be provided together".to_string(),
                ))
            }
        };
        for (name, w) in [("keywordWeight", keyword), ("semanticWeight", semantic)] {
            if !(w.is_finite() && (0.0..=1.0).contains(&w)) {
                return Err(Error::Validation(format!("{name} must be within [0, 1], got {w}")));
            }
        }
        let sum = keyword + semantic;
        if sum <= 0.0 {
            return Err(Error::Validation("keywordWeight and semanticWeight must not both be zero".to_string()));
        }
        let mut warnings = Vec::new();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            let weights = Weights { keyword: keyword / sum, semantic: semantic / sum };
            warnings.push(format!(
                "weights sum to {sum}; normalized to keyword {:.3}, semantic {:.3}",
                weights.keyword, weights.semantic
            ));
            return Ok((weights, warnings));
        }
        Ok((Weights { keyword, semantic }, warnings))
    }

    async fn fetch_query_embedding(&self, query: &str) -> Result<Embedding> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::ProviderUnavailable("no embedding provider configured".to_string()))?;
        let budget = Duration::from_millis(self.config.embedding.timeout_ms);
        match tokio::time::timeout(budget, provider.embed(query)).await {
            Ok(Ok(embedding)) => {
                debug!(model = provider.model_id(), dim = embedding.dim(), "query embedded");
                Ok(embedding)
            }
            Ok(Err(err)) => Err(Error::ProviderUnavailable(format!("{}: {err:#}", provider.model_id()))),
            Err(_) => Err(Error::ProviderUnavailable(format!(
                "{} timed out after {} ms",
                provider.model_id(),
                self.config.embedding.timeout_ms
            ))),
        }
    }
}

fn validate_params(params: &SearchParameters) -> Result<()> {
    if params.result_limit == 0 {
        return Err(Error::Validation("resultLimit must be at least 1".to_string()));
    }
    let t = params.similarity_threshold;
    if !(t.is_finite() && (0.0..=1.0).contains(&t)) {
        return Err(Error::Validation(format!("similarityThreshold must be within [0, 1], got {t}")));
    }
    Ok(())
}

fn to_result(item: RerankItem<'_>, final_rank: usize, terms: &[String], params: &SearchParameters) -> RankedResult {
    let chunk = item.candidate.chunk;
    let mut rerank_scores = BTreeMap::new();
    if let (Some(key), Some(sub)) = (params.reranking_method.score_key(), item.sub_score) {
        rerank_scores.insert(key.to_string(), sub);
    }
    let highlights = if params.enable_highlighting {
        let mut spans = extract_highlights(&chunk.content, terms);
        if spans.is_empty() && item.candidate.semantic_score.is_some_and(|s| s > 0.0) {
            spans.extend(semantic_highlight(&chunk.content));
        }
        spans
    } else {
        Vec::new()
    };
    RankedResult {
        chunk_id: chunk.id.clone(),
        content: chunk.content.clone(),
        score: item.score,
        match_type: item.candidate.match_type,
        initial_rank: item.initial_rank,
        final_rank,
        rerank_scores,
        highlights,
        lexical_score: item.candidate.lexical_score,
        semantic_score: item.candidate.semantic_score,
    }
}
