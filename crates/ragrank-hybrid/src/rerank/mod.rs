//! Second-pass reranking.
//!
//! ```text
//!   first-stage candidates (sorted, pooled)
//!                  │  initial_rank = position + 1
//!                  ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ match RerankMethod                           │
//!   │   None          pass-through                 │
//!   │   Bm25          blend with BM25              │
//!   │   CrossEncoder  n-gram + proximity proxy     │
//!   │   Diversity     greedy redundancy penalty    │
//!   │   LengthPenalty bell curve on word count     │
//!   │   KeywordBoost  additive bonus on term hits  │
//!   └──────────────────────────────────────────────┘
//!                  │  score >= threshold, truncate to limit
//!                  ▼
//!             ordered RerankItems
//! ```
//!
//! Every strategy shares one contract: take the pooled items, return them in
//! final order with `score` and `sub_score` set. Nothing is random; equal
//! scores keep initial rank order.
mod bm25;
mod cross_encoder;
mod diversity;
mod keyword_boost;
mod length;

use std::cmp::Ordering;

use ragrank_core::config::RerankConfig;
use ragrank_core::traits::ChunkStore;
use ragrank_core::types::{RerankMethod, ScoredCandidate};
use ragrank_text::{Bm25Params, Corpus};
use tracing::debug;

pub use cross_encoder::proxy_score;
pub use diversity::content_similarity;
pub use length::{length_multiplier, median_word_count};

/// A candidate moving through the reranking pass.
#[derive(Debug, Clone)]
pub struct RerankItem<'a> {
    pub candidate: ScoredCandidate<'a>,
    /// 1-based position in the first-stage list.
    pub initial_rank: usize,
    pub score: f32,
    /// The active strategy's own score, recorded under `RerankMethod::score_key`.
    pub sub_score: Option<f32>,
}

/// Read-only inputs shared by the strategies.
pub struct RerankContext<'a> {
    pub query_terms: &'a [String],
    /// Term statistics over the whole store, indexed like the store.
    pub corpus: &'a Corpus,
    pub store: &'a dyn ChunkStore,
    pub settings: &'a RerankConfig,
    pub bm25: Bm25Params,
    pub limit: usize,
}

pub fn rerank<'a>(
    method: RerankMethod,
    candidates: Vec<ScoredCandidate<'a>>,
    ctx: &RerankContext<'_>,
    threshold: f32,
) -> Vec<RerankItem<'a>> {
    let items: Vec<RerankItem<'a>> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| RerankItem { score: candidate.combined_score, candidate, initial_rank: i + 1, sub_score: None })
        .collect();
    let pool = items.len();

    let mut ordered = match method {
        RerankMethod::None => items,
        RerankMethod::Bm25 => bm25::rerank(items, ctx),
        RerankMethod::CrossEncoder => cross_encoder::rerank(items, ctx),
        RerankMethod::Diversity => diversity::rerank(items, ctx),
        RerankMethod::LengthPenalty => length::rerank(items, ctx),
        RerankMethod::KeywordBoost => keyword_boost::rerank(items, ctx),
    };
    ordered.retain(|item| item.score >= threshold);
    ordered.truncate(ctx.limit);
    debug!(method = %method, pool, kept = ordered.len(), "reranked candidates");
    ordered
}

/// Score descending, initial rank ascending.
pub(crate) fn sort_by_score(items: &mut [RerankItem<'_>]) {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.initial_rank.cmp(&b.initial_rank))
    });
}
