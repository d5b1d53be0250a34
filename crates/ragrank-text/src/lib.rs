//! ragrank-text
//!
//! Lexical side of the engine: tantivy-analyzer tokenization, TF-IDF and BM25
//! scoring over a per-search corpus, and query-term highlighting.
pub mod highlight;
pub mod lexical;
pub mod tokenizer;

pub use highlight::{extract_highlights, find_occurrences, semantic_highlight};
pub use lexical::{Bm25Params, Corpus, DocStats, LexicalScorer};
pub use tokenizer::{Token, Tokenizer};
