//! BM25 hybrid rerank: corrects embedding scores that miss exact terminology.

use super::{sort_by_score, RerankContext, RerankItem};

pub(super) fn rerank<'a>(mut items: Vec<RerankItem<'a>>, ctx: &RerankContext<'_>) -> Vec<RerankItem<'a>> {
    let raw: Vec<f32> = items
        .iter()
        .map(|item| ctx.corpus.bm25_score(item.candidate.index, ctx.query_terms, ctx.bm25))
        .collect();
    let max = raw.iter().copied().fold(0.0f32, f32::max);
    let blend = ctx.settings.bm25_blend;
    for (item, raw) in items.iter_mut().zip(raw) {
        let bm25 = if max > 0.0 { raw / max } else { 0.0 };
        item.score = blend * item.score + (1.0 - blend) * bm25;
        item.sub_score = Some(bm25);
    }
    sort_by_score(&mut items);
    items
}
