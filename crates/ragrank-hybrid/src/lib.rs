//! Hybrid retrieval: combines lexical and semantic scores, reranks the
//! candidate pool with one selected strategy and returns explainable results.
pub mod combine;
pub mod engine;
pub mod rerank;

pub use combine::{combine, select, Weights};
pub use engine::{SearchEngine, EMPTY_QUERY, NO_CHUNKS_AVAILABLE};
pub use rerank::{rerank, RerankContext, RerankItem};
