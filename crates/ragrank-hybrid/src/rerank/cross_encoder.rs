//! Cross-encoder stand-in.
//!
//! No model is invoked. The proxy scores query/document interaction from
//! shared unigrams, shared consecutive-term bigrams and how tightly the
//! matched terms cluster:
//!
//! ```text
//! score = 0.5 * unigram_overlap + 0.3 * bigram_overlap + 0.2 * proximity
//! proximity = matched terms / width of the smallest window holding all of them
//! ```
//!
//! The proxy replaces the first-stage score entirely.
use std::collections::{HashMap, HashSet};

use ragrank_text::{DocStats, Token};

use super::{sort_by_score, RerankContext, RerankItem};

const UNIGRAM_WEIGHT: f32 = 0.5;
const BIGRAM_WEIGHT: f32 = 0.3;
const PROXIMITY_WEIGHT: f32 = 0.2;

pub fn proxy_score(query_terms: &[String], doc: &DocStats) -> f32 {
    if query_terms.is_empty() || doc.is_empty() {
        return 0.0;
    }
    let matched: Vec<&str> = query_terms.iter().filter(|t| doc.contains(t)).map(String::as_str).collect();
    let unigram = matched.len() as f32 / query_terms.len() as f32;

    let bigram = if query_terms.len() < 2 {
        unigram
    } else {
        let doc_bigrams: HashSet<(&str, &str)> = doc
            .tokens
            .windows(2)
            .map(|w| (w[0].text.as_str(), w[1].text.as_str()))
            .collect();
        let shared = query_terms
            .windows(2)
            .filter(|w| doc_bigrams.contains(&(w[0].as_str(), w[1].as_str())))
            .count();
        shared as f32 / (query_terms.len() - 1) as f32
    };

    let proximity = match matched.len() {
        0 => 0.0,
        1 => 1.0,
        m => min_window(&doc.tokens, &matched).map_or(0.0, |width| m as f32 / width as f32),
    };

    (UNIGRAM_WEIGHT * unigram + BIGRAM_WEIGHT * bigram + PROXIMITY_WEIGHT * proximity).clamp(0.0, 1.0)
}

/// Width, in token positions, of the smallest window containing every wanted term.
fn min_window(tokens: &[Token], wanted: &[&str]) -> Option<usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut have = 0;
    let mut best: Option<usize> = None;
    let mut left = 0;
    for right in tokens {
        let t = right.text.as_str();
        if wanted.contains(&t) {
            let c = counts.entry(t).or_insert(0);
            if *c == 0 {
                have += 1;
            }
            *c += 1;
        }
        while have == wanted.len() {
            let width = right.position - tokens[left].position + 1;
            best = Some(best.map_or(width, |b| b.min(width)));
            if let Some(c) = counts.get_mut(tokens[left].text.as_str()) {
                *c -= 1;
                if *c == 0 {
                    have -= 1;
                }
            }
            left += 1;
        }
    }
    best
}

pub(super) fn rerank<'a>(mut items: Vec<RerankItem<'a>>, ctx: &RerankContext<'_>) -> Vec<RerankItem<'a>> {
    for item in &mut items {
        let score = proxy_score(ctx.query_terms, ctx.corpus.doc(item.candidate.index));
        item.score = score;
        item.sub_score = Some(score);
    }
    sort_by_score(&mut items);
    items
}
