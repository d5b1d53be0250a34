use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

pub const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// A lowercase word token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub text: String,
	pub start: usize,
	pub end: usize,
	pub position: usize,
}

/// Splits on non-alphanumeric characters and lowercases, optionally dropping
/// English stop words. Positions survive stop-word removal.
#[derive(Clone)]
pub struct Tokenizer {
	analyzer: TextAnalyzer,
}

impl Tokenizer {
	pub fn new(remove_stop_words: bool) -> Self {
		let analyzer = if remove_stop_words {
			TextAnalyzer::builder(SimpleTokenizer::default())
				.filter(LowerCaser)
				.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
				.build()
		} else {
			TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
		};
		Self { analyzer }
	}

	pub fn tokenize(&self, text: &str) -> Vec<Token> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			let t = stream.token();
			tokens.push(Token { text: t.text.clone(), start: t.offset_from, end: t.offset_to, position: t.position });
		}
		tokens
	}

	/// Distinct query terms in first-occurrence order.
	pub fn query_terms(&self, query: &str) -> Vec<String> {
		let mut terms: Vec<String> = Vec::new();
		for t in self.tokenize(query) {
			if !terms.contains(&t.text) { terms.push(t.text); }
		}
		terms
	}
}

impl Default for Tokenizer {
	fn default() -> Self { Self::new(false) }
}
