//! Diversity promotion by greedy selection.
//!
//! Each round picks the remaining candidate with the highest effective score
//! `score - penalty * max_similarity_to_selected`. Similarity only grows as
//! the selection grows, so effective scores of successive picks never
//! increase and the output is already sorted.
use ragrank_core::types::ScoredCandidate;
use ragrank_vector::cosine_similarity;

use super::{RerankContext, RerankItem};

/// Clamped embedding cosine when both chunks carry comparable embeddings,
/// token-set Jaccard otherwise.
pub fn content_similarity(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>, ctx: &RerankContext<'_>) -> f32 {
    if let (Some(ea), Some(eb)) = (ctx.store.embedding(&a.chunk.id), ctx.store.embedding(&b.chunk.id)) {
        if let Ok(sim) = cosine_similarity(&ea.vector, &eb.vector) {
            return sim.max(0.0);
        }
    }
    let sa = ctx.corpus.doc(a.index).term_set();
    let sb = ctx.corpus.doc(b.index).term_set();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 0.0;
    }
    sa.intersection(&sb).count() as f32 / union as f32
}

pub(super) fn rerank<'a>(items: Vec<RerankItem<'a>>, ctx: &RerankContext<'_>) -> Vec<RerankItem<'a>> {
    let penalty = ctx.settings.diversity_penalty;
    let mut remaining: Vec<(RerankItem<'a>, f32)> = items.into_iter().map(|item| (item, 0.0)).collect();
    let mut selected: Vec<RerankItem<'a>> = Vec::with_capacity(ctx.limit.min(remaining.len()));

    while selected.len() < ctx.limit && !remaining.is_empty() {
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (i, (item, max_sim)) in remaining.iter().enumerate() {
            let effective = item.score - penalty * max_sim;
            let better = effective > best_score
                || (effective == best_score && item.initial_rank < remaining[best].0.initial_rank);
            if better {
                best = i;
                best_score = effective;
            }
        }
        let (mut pick, max_sim) = remaining.remove(best);
        pick.score = best_score.max(0.0);
        pick.sub_score = Some(1.0 - max_sim);
        for (item, sim) in &mut remaining {
            *sim = sim.max(content_similarity(&item.candidate, &pick.candidate, ctx));
        }
        selected.push(pick);
    }
    selected
}
