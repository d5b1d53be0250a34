use thiserror::Error;

/// Errors raised by the retrieval engine.
///
/// Only `Validation` is fatal to a search call. `DimensionMismatch` and
/// `ProviderUnavailable` are recovered inside the engine and surface as
/// response warnings through their `Display` text.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid search parameters: {0}")]
    Validation(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
