use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use ragrank_core::config::EngineConfig;
use ragrank_core::error::Error;
use ragrank_core::store::InMemoryChunkStore;
use ragrank_core::traits::EmbeddingProvider;
use ragrank_core::types::{
    Chunk, Embedding, HighlightKind, MatchType, RerankMethod, SearchMode, SearchParameters, SearchRequest,
};
use ragrank_embed::{backfill, HashingEmbedder};
use ragrank_hybrid::{SearchEngine, EMPTY_QUERY, NO_CHUNKS_AVAILABLE};

fn ml_store() -> InMemoryChunkStore {
    InMemoryChunkStore::new(vec![
        Chunk::new("A", "Machine learning models learn from data.", "sentence"),
        Chunk::new("B", "Deep learning uses neural networks.", "sentence"),
        Chunk::new("C", "Gardening tips for spring.", "sentence"),
    ])
    .unwrap()
}

fn params(mode: SearchMode, limit: usize) -> SearchParameters {
    SearchParameters { mode, result_limit: limit, ..SearchParameters::default() }
}

fn ids(resp: &ragrank_core::types::SearchResponse) -> Vec<&str> {
    resp.results.iter().map(|r| r.chunk_id.as_str()).collect()
}

struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn model_id(&self) -> &str { "failing" }
    fn dim(&self) -> usize { 2 }
    async fn embed(&self, _text: &str) -> anyhow::Result<Embedding> {
        Err(anyhow!("model offline"))
    }
}

struct SlowProvider;

#[async_trait]
impl EmbeddingProvider for SlowProvider {
    fn model_id(&self) -> &str { "slow" }
    fn dim(&self) -> usize { 2 }
    async fn embed(&self, _text: &str) -> anyhow::Result<Embedding> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Embedding::new(vec![1.0, 0.0], "slow"))
    }
}

#[tokio::test]
async fn keyword_search_ranks_machine_learning_scenario() {
    let store = ml_store();
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let resp = engine.search("machine learning", &store, None, &params(SearchMode::Keyword, 3)).await.unwrap();

    assert_eq!(ids(&resp), ["A", "B", "C"]);
    let s: Vec<f32> = resp.results.iter().map(|r| r.score).collect();
    assert!(s[0] > s[1] && s[1] > s[2], "{s:?}");
    assert_eq!(s[2], 0.0);
    assert!(resp.warnings.is_empty(), "{:?}", resp.warnings);
    assert!(resp.results.iter().all(|r| r.match_type == MatchType::Keyword));
    assert!(resp.results.iter().all(|r| r.final_rank == r.initial_rank), "pass-through keeps ranks");
    let finals: Vec<usize> = resp.results.iter().map(|r| r.final_rank).collect();
    assert_eq!(finals, [1, 2, 3]);

    let a = &resp.results[0];
    let marked: Vec<&str> = a.highlights.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(marked, ["Machine", "learning"]);
    assert_eq!(resp.metrics.total_chunks, 3);
    assert_eq!(resp.metrics.retrieved_chunks, 3);
    assert_eq!(resp.metrics.mode, SearchMode::Keyword);
}

#[tokio::test]
async fn hybrid_search_with_hashing_provider() {
    let mut store = ml_store();
    let provider = Arc::new(HashingEmbedder::default());
    backfill(provider.as_ref(), &mut store).await.unwrap();

    let engine = SearchEngine::new(EngineConfig::default(), Some(provider)).unwrap();
    let resp = engine.search("machine learning", &store, None, &params(SearchMode::Hybrid, 3)).await.unwrap();

    assert_eq!(resp.metrics.mode, SearchMode::Hybrid);
    assert!(resp.warnings.is_empty(), "{:?}", resp.warnings);
    assert_eq!(resp.results[0].chunk_id, "A");
    assert_eq!(resp.results[0].match_type, MatchType::Hybrid);
    assert!(resp.results.iter().all(|r| r.semantic_score.is_some()));
}

#[tokio::test]
async fn empty_store_and_empty_query_warn() {
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let empty = InMemoryChunkStore::default();
    let resp = engine.search("anything", &empty, None, &params(SearchMode::Hybrid, 5)).await.unwrap();
    assert!(resp.results.is_empty());
    assert_eq!(resp.warnings, [NO_CHUNKS_AVAILABLE]);
    assert_eq!(resp.metrics.total_chunks, 0);

    let resp = engine.search("   ", &ml_store(), None, &params(SearchMode::Keyword, 5)).await.unwrap();
    assert!(resp.results.is_empty());
    assert_eq!(resp.warnings, [EMPTY_QUERY]);
}

#[tokio::test]
async fn identical_inputs_give_identical_results() {
    let mut store = ml_store();
    let provider = Arc::new(HashingEmbedder::new(64));
    backfill(provider.as_ref(), &mut store).await.unwrap();
    let engine = SearchEngine::new(EngineConfig::default(), Some(provider)).unwrap();

    for method in [RerankMethod::None, RerankMethod::CrossEncoder, RerankMethod::Diversity] {
        let p = SearchParameters { reranking_method: method, ..params(SearchMode::Hybrid, 3) };
        let first = engine.search("learning data", &store, None, &p).await.unwrap();
        let second = engine.search("learning data", &store, None, &p).await.unwrap();
        assert_eq!(serde_json::to_value(&first.results).unwrap(), serde_json::to_value(&second.results).unwrap());
        assert_eq!(first.warnings, second.warnings);
        // everything but wall-clock timing is reproducible
        let (mut m1, mut m2) = (first.metrics.clone(), second.metrics.clone());
        m1.elapsed_ms = 0;
        m2.elapsed_ms = 0;
        assert_eq!(m1, m2);
    }
}

#[tokio::test]
async fn threshold_applies_to_every_result() {
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let p = SearchParameters { similarity_threshold: 0.5, ..params(SearchMode::Keyword, 5) };
    let resp = engine.search("machine learning", &ml_store(), None, &p).await.unwrap();
    assert_eq!(ids(&resp), ["A", "B"]);
    assert!(resp.results.iter().all(|r| r.score >= 0.5));

    let p = SearchParameters { similarity_threshold: 1.0, ..params(SearchMode::Keyword, 5) };
    let resp = engine.search("unrelated words", &ml_store(), None, &p).await.unwrap();
    assert!(resp.results.is_empty(), "no fallback when nothing passes");
}

#[tokio::test]
async fn hybrid_falls_back_to_lexical_for_unembedded_chunks() {
    let store = ml_store().with_embedding("B", Embedding::new(vec![0.0, 1.0], "test")).unwrap();
    let query = Embedding::new(vec![0.0, 1.0], "test");
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let resp = engine.search("machine learning", &store, Some(&query), &params(SearchMode::Hybrid, 3)).await.unwrap();

    let a = resp.results.iter().find(|r| r.chunk_id == "A").unwrap();
    assert_eq!(a.semantic_score, None);
    assert_eq!(a.score, a.lexical_score);
    assert_eq!(a.match_type, MatchType::Keyword);

    let b = resp.results.iter().find(|r| r.chunk_id == "B").unwrap();
    assert_eq!(b.match_type, MatchType::Hybrid);
    assert!((b.score - (0.3 * b.lexical_score + 0.7)).abs() < 1e-5);
}

#[tokio::test]
async fn failing_provider_degrades_to_keyword() {
    let engine = SearchEngine::new(EngineConfig::default(), Some(Arc::new(FailingProvider))).unwrap();
    let resp = engine.search("machine learning", &ml_store(), None, &params(SearchMode::Hybrid, 3)).await.unwrap();
    assert_eq!(resp.metrics.mode, SearchMode::Keyword);
    assert_eq!(ids(&resp), ["A", "B", "C"]);
    assert_eq!(resp.warnings.len(), 1);
    assert!(resp.warnings[0].contains("unavailable") && resp.warnings[0].contains("model offline"), "{:?}", resp.warnings);
}

#[tokio::test]
async fn missing_provider_degrades_to_keyword() {
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let resp = engine.search("machine learning", &ml_store(), None, &params(SearchMode::Semantic, 3)).await.unwrap();
    assert_eq!(resp.metrics.mode, SearchMode::Keyword);
    assert_eq!(resp.results[0].chunk_id, "A");
    assert_eq!(resp.warnings.len(), 1);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let mut config = EngineConfig::default();
    config.embedding.timeout_ms = 20;
    let engine = SearchEngine::new(config, Some(Arc::new(SlowProvider))).unwrap();
    let resp = engine.search("machine learning", &ml_store(), None, &params(SearchMode::Semantic, 3)).await.unwrap();
    assert_eq!(resp.metrics.mode, SearchMode::Keyword);
    assert!(resp.warnings[0].contains("timed out"), "{:?}", resp.warnings);
    assert_eq!(ids(&resp), ["A", "B", "C"]);
}

#[tokio::test]
async fn dimension_mismatch_excludes_chunk_with_warning() {
    let store = InMemoryChunkStore::new(vec![
        Chunk::new("a", "first chunk", "t"),
        Chunk::new("b", "second chunk", "t"),
    ])
    .unwrap()
    .with_embedding("a", Embedding::new(vec![1.0, 0.0], "m"))
    .unwrap()
    .with_embedding("b", Embedding::new(vec![1.0, 0.0, 0.0], "m"))
    .unwrap();
    let query = Embedding::new(vec![1.0, 0.0], "m");
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let resp = engine.search("chunk", &store, Some(&query), &params(SearchMode::Semantic, 5)).await.unwrap();

    assert_eq!(ids(&resp), ["a"]);
    assert_eq!(resp.warnings.len(), 1);
    assert!(resp.warnings[0].contains("'b'") && resp.warnings[0].contains("dimension mismatch"), "{:?}", resp.warnings);
}

#[tokio::test]
async fn semantic_mode_skips_unembedded_chunks() {
    let store = ml_store().with_embedding("C", Embedding::new(vec![1.0, 0.0], "m")).unwrap();
    let query = Embedding::new(vec![1.0, 0.0], "m");
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let resp = engine.search("spring", &store, Some(&query), &params(SearchMode::Semantic, 5)).await.unwrap();
    assert_eq!(ids(&resp), ["C"]);
    assert_eq!(resp.results[0].match_type, MatchType::Semantic);
    assert_eq!(resp.metrics.candidates_scored, 1);
    assert!(resp.warnings[0].starts_with("2 chunks without embeddings"), "{:?}", resp.warnings);
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let store = ml_store();
    let bad = [
        SearchParameters { result_limit: 0, ..SearchParameters::default() },
        SearchParameters { similarity_threshold: 1.5, ..SearchParameters::default() },
        SearchParameters { similarity_threshold: f32::NAN, ..SearchParameters::default() },
        SearchParameters { keyword_weight: Some(0.5), ..SearchParameters::default() },
        SearchParameters { keyword_weight: Some(-0.1), semantic_weight: Some(0.9), ..SearchParameters::default() },
        SearchParameters { keyword_weight: Some(0.0), semantic_weight: Some(0.0), ..SearchParameters::default() },
    ];
    for p in &bad {
        let err = engine.search("machine", &store, None, p).await.err();
        assert!(matches!(err, Some(Error::Validation(_))), "{p:?} -> {err:?}");
    }
}

#[tokio::test]
async fn weights_not_summing_to_one_are_normalized() {
    let store = ml_store().with_embedding("B", Embedding::new(vec![0.0, 1.0], "m")).unwrap();
    let query = Embedding::new(vec![0.0, 1.0], "m");
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let p = SearchParameters { keyword_weight: Some(1.0), semantic_weight: Some(1.0), ..params(SearchMode::Hybrid, 3) };
    let resp = engine.search("learning", &store, Some(&query), &p).await.unwrap();

    assert!(resp.warnings.iter().any(|w| w.contains("normalized")), "{:?}", resp.warnings);
    let b = resp.results.iter().find(|r| r.chunk_id == "B").unwrap();
    assert!((b.score - (0.5 * b.lexical_score + 0.5)).abs() < 1e-5);
}

#[tokio::test]
async fn highlighting_can_be_disabled_and_semantic_spans_fill_in() {
    let store = ml_store().with_embedding("C", Embedding::new(vec![1.0, 0.0], "m")).unwrap();
    let query = Embedding::new(vec![1.0, 0.0], "m");
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();

    let resp = engine.search("flowers", &store, Some(&query), &params(SearchMode::Hybrid, 1)).await.unwrap();
    let c = &resp.results[0];
    assert_eq!(c.chunk_id, "C");
    assert_eq!(c.highlights.len(), 1);
    assert_eq!(c.highlights[0].kind, HighlightKind::Semantic);
    assert_eq!(c.highlights[0].text, "Gardening tips for spring.");

    let p = SearchParameters { enable_highlighting: false, ..params(SearchMode::Keyword, 3) };
    let resp = engine.search("machine learning", &store, None, &p).await.unwrap();
    assert!(resp.results.iter().all(|r| r.highlights.is_empty()));
}

#[tokio::test]
async fn request_json_drives_search() {
    let req: SearchRequest = serde_json::from_str(
        r#"{"query": "machine learning", "mode": "keyword", "resultLimit": 2, "similarityThreshold": 0.0,
            "rerankingMethod": "bm25"}"#,
    )
    .unwrap();
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let resp = engine.search_request(&req, &ml_store()).await.unwrap();
    assert_eq!(resp.results.len(), 2);
    assert_eq!(resp.metrics.reranking_method, RerankMethod::Bm25);

    let json = serde_json::to_value(&resp).unwrap();
    let first = &json["results"][0];
    assert_eq!(first["chunkId"], "A");
    assert_eq!(first["matchType"], "keyword");
    assert!(first["rerankScores"]["bm25_score"].is_number());
    assert_eq!(first["highlights"][0]["type"], "exact");
}

#[tokio::test]
async fn out_of_range_engine_config_is_rejected() {
    let mut config = EngineConfig::default();
    config.rerank.pool_factor = 0;
    let err = SearchEngine::new(config, None).err();
    assert!(matches!(err, Some(Error::InvalidConfig(ref msg)) if msg.contains("pool_factor")), "{err:?}");

    let mut config = EngineConfig::default();
    config.rerank.length_tolerance = 0.0;
    assert!(matches!(SearchEngine::new(config, None).err(), Some(Error::InvalidConfig(_))));

    // a valid config still ranks with a non-trivial rerank pool
    let engine = SearchEngine::new(EngineConfig::default(), None).unwrap();
    let p = SearchParameters { reranking_method: RerankMethod::Bm25, ..params(SearchMode::Keyword, 2) };
    let resp = engine.search("machine learning", &ml_store(), None, &p).await.unwrap();
    assert_eq!(ids(&resp), ["A", "B"]);
}
