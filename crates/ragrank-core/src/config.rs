//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys are addressed with `__` in env vars, e.g.
//! `APP_ENGINE__RERANK__DIVERSITY_PENALTY=0.7`.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from the current directory using `RUST_ENV` (default `dev`).
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(dir, &env_name)
    }

    pub fn load_for_env(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.engine()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn get_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(default) }
    }

    /// Typed engine settings from the `engine` table, defaults filled in.
    pub fn engine(&self) -> anyhow::Result<EngineConfig> {
        let engine: EngineConfig = self.get_or("engine", EngineConfig::default())?;
        engine.validate()?;
        Ok(engine)
    }
}

/// Tunables of the retrieval engine. Every field has a default so a missing
/// or partial `[engine]` table is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lexical: LexicalConfig,
    pub hybrid: HybridConfig,
    pub rerank: RerankConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    pub remove_stop_words: bool,
    pub bm25_k1: f32,
    pub bm25_b: f32,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self { remove_stop_words: false, bm25_k1: 1.5, bm25_b: 0.75 }
    }
}

/// Weights used when a hybrid search does not carry its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub keyword_weight: f32,
    pub semantic_weight: f32,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self { keyword_weight: 0.3, semantic_weight: 0.7 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Candidate pool handed to the reranker, as a multiple of the result limit.
    pub pool_factor: usize,
    /// Share of the first-stage score kept by the `bm25` strategy.
    pub bm25_blend: f32,
    pub diversity_penalty: f32,
    pub keyword_bonus: f32,
    /// Optimal chunk length in words; the corpus median when unset.
    pub optimal_length: Option<usize>,
    /// Width of the length bell curve in log space.
    pub length_tolerance: f32,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            pool_factor: 3,
            bm25_blend: 0.5,
            diversity_penalty: 0.5,
            keyword_bonus: 0.2,
            optimal_length: None,
            length_tolerance: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Budget for one query-embedding request.
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { timeout_ms: 3_000 }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> crate::Result<()> {
        let unit = |name: &str, v: f32| -> crate::Result<()> {
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must be within [0, 1], got {v}")))
            }
        };
        if !(self.lexical.bm25_k1.is_finite() && self.lexical.bm25_k1 > 0.0) {
            return Err(Error::InvalidConfig(format!("lexical.bm25_k1 must be positive, got {}", self.lexical.bm25_k1)));
        }
        unit("lexical.bm25_b", self.lexical.bm25_b)?;
        unit("hybrid.keyword_weight", self.hybrid.keyword_weight)?;
        unit("hybrid.semantic_weight", self.hybrid.semantic_weight)?;
        if self.hybrid.keyword_weight + self.hybrid.semantic_weight <= 0.0 {
            return Err(Error::InvalidConfig("hybrid weights must not both be zero".to_string()));
        }
        if self.rerank.pool_factor == 0 {
            return Err(Error::InvalidConfig("rerank.pool_factor must be at least 1".to_string()));
        }
        unit("rerank.bm25_blend", self.rerank.bm25_blend)?;
        unit("rerank.keyword_bonus", self.rerank.keyword_bonus)?;
        if !(self.rerank.diversity_penalty.is_finite() && self.rerank.diversity_penalty >= 0.0) {
            return Err(Error::InvalidConfig(format!("rerank.diversity_penalty must be non-negative, got {}", self.rerank.diversity_penalty)));
        }
        if !(self.rerank.length_tolerance.is_finite() && self.rerank.length_tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!("rerank.length_tolerance must be positive, got {}", self.rerank.length_tolerance)));
        }
        if self.rerank.optimal_length == Some(0) {
            return Err(Error::InvalidConfig("rerank.optimal_length must be at least 1".to_string()));
        }
        if self.embedding.timeout_ms == 0 {
            return Err(Error::InvalidConfig("embedding.timeout_ms must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
