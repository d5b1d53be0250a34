use super::{sort_by_score, RerankContext, RerankItem};

pub(super) fn rerank<'a>(mut items: Vec<RerankItem<'a>>, ctx: &RerankContext<'_>) -> Vec<RerankItem<'a>> {
    let total = ctx.query_terms.len();
    for item in &mut items {
        let content = item.candidate.chunk.content.to_lowercase();
        let matched = ctx.query_terms.iter().filter(|t| content.contains(t.as_str())).count();
        if matched > 0 {
            item.score = (item.score + ctx.settings.keyword_bonus).min(1.0);
        }
        item.sub_score = Some(if total == 0 { 0.0 } else { matched as f32 / total as f32 });
    }
    sort_by_score(&mut items);
    items
}
