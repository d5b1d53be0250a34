use ragrank_core::store::InMemoryChunkStore;
use ragrank_core::traits::{ChunkStore, EmbeddingProvider};
use ragrank_core::types::{Chunk, Embedding};
use ragrank_embed::{backfill, get_default_provider, HashingEmbedder, DEFAULT_DIM};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn hashing_embedder_shapes_and_determinism() {
    let embedder = HashingEmbedder::new(64);
    let v1 = embedder.embed("hello world").await.expect("embed");
    let v2 = embedder.embed("Hello, WORLD!").await.expect("embed");

    assert_eq!(v1.dim(), 64);
    assert_eq!(embedder.model_id(), "hashing:xxh64:d64");

    // Norm approximately 1.0
    let norm: f32 = v1.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Same words, different casing and punctuation
    for (a, b) in v1.vector.iter().zip(v2.vector.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_raise_similarity() {
    let e = HashingEmbedder::default();
    let a = e.embed_text("rust ownership and borrowing");
    let b = e.embed_text("ownership and borrowing in rust");
    let c = e.embed_text("tomato soup recipe");
    assert!(cosine(&a, &b) > cosine(&a, &c));
    assert!(e.embed_text("").iter().all(|x| *x == 0.0));
}

#[tokio::test]
async fn backfill_fills_only_missing_embeddings() {
    let mut store = InMemoryChunkStore::new(vec![
        Chunk::new("a", "alpha", "test"),
        Chunk::new("b", "bravo", "test"),
    ])
    .unwrap()
    .with_embedding("a", Embedding::new(vec![1.0, 0.0], "manual"))
    .unwrap();

    let added = backfill(&HashingEmbedder::new(8), &mut store).await.expect("backfill");
    assert_eq!(added, 1);
    assert_eq!(store.embedding("a").map(|e| e.model.as_str()), Some("manual"));
    assert_eq!(store.embedding("b").map(Embedding::dim), Some(8));
    assert_eq!(backfill(&HashingEmbedder::new(8), &mut store).await.unwrap(), 0);
}

#[tokio::test]
async fn default_provider_is_hashing() {
    let provider = get_default_provider();
    assert_eq!(provider.dim(), DEFAULT_DIM);
    assert_eq!(provider.model_id(), format!("hashing:xxh64:d{DEFAULT_DIM}"));
    let e = provider.embed("offline search").await.unwrap();
    assert_eq!(e.model, provider.model_id());
}
