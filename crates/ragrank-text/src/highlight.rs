//! Query-term highlighting.
//!
//! Every case-insensitive occurrence of a query term is an `exact` span.
//! Overlapping or touching spans collapse into one `partial` span covering
//! their union; its `text` joins the constituent matches with `+`. The output
//! is sorted by start and never overlaps. Offsets are byte offsets on char
//! boundaries of the original content.
use ragrank_core::types::{HighlightKind, TextHighlight};

/// Byte ranges of every case-insensitive occurrence of `term` in `content`,
/// overlapping occurrences included.
pub fn find_occurrences(content: &str, term: &str) -> Vec<(usize, usize)> {
	let needle: Vec<char> = term.chars().flat_map(char::to_lowercase).collect();
	if needle.is_empty() { return Vec::new(); }
	content.char_indices()
		.filter_map(|(i, _)| match_at(&content[i..], &needle).map(|len| (i, i + len)))
		.collect()
}

fn match_at(hay: &str, needle: &[char]) -> Option<usize> {
	let mut k = 0;
	for (j, ch) in hay.char_indices() {
		for lc in ch.to_lowercase() {
			if k < needle.len() && lc == needle[k] { k += 1; } else { return None; }
		}
		if k == needle.len() { return Some(j + ch.len_utf8()); }
	}
	None
}

pub fn extract_highlights(content: &str, terms: &[String]) -> Vec<TextHighlight> {
	let mut spans: Vec<(usize, usize)> = terms.iter().flat_map(|t| find_occurrences(content, t)).collect();
	spans.sort_unstable();
	spans.dedup();

	let mut merged: Vec<(usize, usize, Vec<&str>)> = Vec::new();
	for (start, end) in spans {
		match merged.last_mut() {
			Some((_, last_end, parts)) if start <= *last_end => {
				*last_end = (*last_end).max(end);
				parts.push(&content[start..end]);
			}
			_ => merged.push((start, end, vec![&content[start..end]])),
		}
	}

	merged.into_iter().map(|(start, end, parts)| {
		if parts.len() == 1 {
			TextHighlight { start, end, text: parts[0].to_string(), kind: HighlightKind::Exact }
		} else {
			TextHighlight { start, end, text: parts.join("+"), kind: HighlightKind::Partial }
		}
	}).collect()
}

/// Span for a purely semantic match: the first sentence of the content,
/// surrounding whitespace excluded.
pub fn semantic_highlight(content: &str) -> Option<TextHighlight> {
	let start = content.len() - content.trim_start().len();
	let body = &content[start..];
	let end = match body.find(&['.', '!', '?'][..]) {
		Some(i) => start + i + 1,
		None => start + body.trim_end().len(),
	};
	if start >= end { return None; }
	Some(TextHighlight { start, end, text: content[start..end].to_string(), kind: HighlightKind::Semantic })
}
