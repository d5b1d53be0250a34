//! Length optimization: a bell curve over word count, in log space, peaking
//! at the optimal length.
//!
//! ```text
//! m(words) = exp(-(ln(words / optimal))^2 / (2 * tolerance^2))
//! ```

use ragrank_core::types::Chunk;

use super::{sort_by_score, RerankContext, RerankItem};

pub fn length_multiplier(words: usize, optimal: f32, tolerance: f32) -> f32 {
    if words == 0 || optimal <= 0.0 {
        return 0.0;
    }
    let x = (words as f32 / optimal).ln();
    (-(x * x) / (2.0 * tolerance * tolerance)).exp()
}

/// Median word count; mean of the two middle values for even counts.
pub fn median_word_count(chunks: &[Chunk]) -> f32 {
    let mut counts: Vec<usize> = chunks.iter().map(Chunk::words).collect();
    if counts.is_empty() {
        return 0.0;
    }
    counts.sort_unstable();
    let mid = counts.len() / 2;
    if counts.len() % 2 == 0 {
        (counts[mid - 1] + counts[mid]) as f32 / 2.0
    } else {
        counts[mid] as f32
    }
}

pub(super) fn rerank<'a>(mut items: Vec<RerankItem<'a>>, ctx: &RerankContext<'_>) -> Vec<RerankItem<'a>> {
    let optimal = match ctx.settings.optimal_length {
        Some(words) => words as f32,
        None => median_word_count(ctx.store.list_chunks()),
    };
    for item in &mut items {
        let m = length_multiplier(item.candidate.chunk.words(), optimal, ctx.settings.length_tolerance);
        item.score *= m;
        item.sub_score = Some(m);
    }
    sort_by_score(&mut items);
    items
}
