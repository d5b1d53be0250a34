//! ragrank-vector
//!
//! Cosine scoring of chunk embeddings against a query embedding, and the
//! pairwise chunk similarity graph.
pub mod search;

pub use search::{cosine_similarity, similar_pairs, similarity_percent, SemanticScorer, SemanticScores, SimilarPair};
