use std::cmp::Ordering;

use ragrank_core::types::{Chunk, MatchType, ScoredCandidate, SearchMode};

/// Blend weights for hybrid mode, already normalized to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub keyword: f32,
    pub semantic: f32,
}

/// Build one candidate per scorable chunk, in chunk order.
///
/// - keyword: combined = lexical
/// - semantic: combined = semantic; chunks without a semantic score are left out
/// - hybrid: combined = kw * lexical + sw * semantic, or lexical alone when the
///   chunk has no semantic score
pub fn combine<'a>(
    chunks: &'a [Chunk],
    lexical: &[f32],
    semantic: Option<&[Option<f32>]>,
    mode: SearchMode,
    weights: Weights,
) -> Vec<ScoredCandidate<'a>> {
    chunks
        .iter()
        .enumerate()
        .filter_map(|(index, chunk)| {
            let lexical_score = lexical.get(index).copied().unwrap_or(0.0);
            let semantic_score = semantic.and_then(|s| s.get(index).copied().flatten());
            let (combined_score, match_type) = match (mode, semantic_score) {
                (SearchMode::Keyword, _) => (lexical_score, MatchType::Keyword),
                (SearchMode::Semantic, None) => return None,
                (SearchMode::Semantic, Some(sem)) => (sem, MatchType::Semantic),
                (SearchMode::Hybrid, None) => (lexical_score, MatchType::Keyword),
                (SearchMode::Hybrid, Some(sem)) => {
                    let combined = weights.keyword * lexical_score + weights.semantic * sem;
                    let match_type = match (lexical_score > 0.0, sem > 0.0) {
                        (true, true) => MatchType::Hybrid,
                        (false, true) => MatchType::Semantic,
                        _ => MatchType::Keyword,
                    };
                    (combined, match_type)
                }
            };
            Some(ScoredCandidate { index, chunk, lexical_score, semantic_score, combined_score, match_type })
        })
        .collect()
}

/// Drop candidates under `threshold`, sort by combined score (ties keep chunk
/// order) and keep the first `pool`.
pub fn select(mut candidates: Vec<ScoredCandidate<'_>>, threshold: f32, pool: usize) -> Vec<ScoredCandidate<'_>> {
    candidates.retain(|c| c.combined_score >= threshold);
    candidates.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
    candidates.truncate(pool);
    candidates
}
