use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use ragrank_core::config::{expand_path, Config};
use ragrank_core::store::InMemoryChunkStore;
use ragrank_core::traits::ChunkStore;
use ragrank_core::types::{HighlightKind, RerankMethod, SearchMode, SearchParameters, SearchResponse};
use ragrank_embed::{backfill, get_default_provider};
use ragrank_hybrid::SearchEngine;
use ragrank_vector::{similar_pairs, similarity_percent};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: ragrank <search|similar> [args...]
  ragrank search \"<query>\" [chunks.json] [--mode keyword|semantic|hybrid] [--limit N] [--threshold T] [--rerank METHOD] [--no-highlight] [--json]
  ragrank similar [threshold] [chunks.json]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Parameters from `[search]` in config, before flag overrides.
fn params_from_config(config: &Config) -> anyhow::Result<SearchParameters> {
    let d = SearchParameters::default();
    let mode: String = config.get_or("search.mode", d.mode.to_string())?;
    let rerank: String = config.get_or("search.reranking_method", d.reranking_method.to_string())?;
    Ok(SearchParameters {
        mode: mode.parse()?,
        result_limit: config.get_or("search.result_limit", d.result_limit)?,
        similarity_threshold: config.get_or("search.similarity_threshold", d.similarity_threshold)?,
        keyword_weight: None,
        semantic_weight: None,
        enable_highlighting: config.get_or("search.enable_highlighting", d.enable_highlighting)?,
        reranking_method: rerank.parse()?,
    })
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> anyhow::Result<&'a str> {
    args.get(i + 1).map(String::as_str).with_context(|| format!("{flag} requires a value"))
}

async fn load_store(config: &Config, path: Option<PathBuf>) -> anyhow::Result<InMemoryChunkStore> {
    let path = match path {
        Some(p) => p,
        None => expand_path(config.get_or("data.chunks_file", "demo_data/chunks.json".to_string())?),
    };
    let mut store = InMemoryChunkStore::from_json_file(&path)?;
    info!(path = %path.display(), chunks = store.len(), embedded = store.embedded_count(), "loaded chunk store");
    if config.get_or("embedding.backfill", true)? {
        let provider = get_default_provider();
        backfill(provider.as_ref(), &mut store).await?;
    }
    Ok(store)
}

fn print_response(query: &str, resp: &SearchResponse) {
    println!("🔍 \"{}\"  mode={}  rerank={}", query, resp.metrics.mode, resp.metrics.reranking_method);
    for w in &resp.warnings { println!("⚠️  {w}"); }
    for r in &resp.results {
        let sem = r.semantic_score.map_or_else(|| "-".to_string(), |s| format!("{:.0}%", similarity_percent(s)));
        println!("\n  {}. score={:.4}  id={}  match={:?}  initial={}  lexical={:.3}  semantic={}", r.final_rank, r.score, r.chunk_id, r.match_type, r.initial_rank, r.lexical_score, sem);
        for (k, v) in &r.rerank_scores { println!("     {k}={v:.3}"); }
        let marked: Vec<String> = r.highlights.iter().map(|h| match h.kind {
            HighlightKind::Semantic => format!("~{}~", h.text),
            _ => format!("[{}]", h.text),
        }).collect();
        if !marked.is_empty() { println!("     📝 {}", marked.join(" ")); }
        println!("     {}", r.content);
    }
    println!("\n📊 {} of {} chunks ({} scored), avg score {:.4}, {} ms", resp.metrics.retrieved_chunks, resp.metrics.total_chunks, resp.metrics.candidates_scored, resp.metrics.avg_score, resp.metrics.elapsed_ms);
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "search" => {
            let mut params = params_from_config(&config)?;
            let mut positional = Vec::new();
            let mut json = false;
            let mut i = 0;
            while i < args.len() {
                match args[i].as_str() {
                    "--mode" => { params.mode = flag_value(&args, i, "--mode")?.parse::<SearchMode>()?; i += 1; }
                    "--limit" => { params.result_limit = flag_value(&args, i, "--limit")?.parse().context("--limit requires a number")?; i += 1; }
                    "--threshold" => { params.similarity_threshold = flag_value(&args, i, "--threshold")?.parse().context("--threshold requires a number")?; i += 1; }
                    "--rerank" => { params.reranking_method = flag_value(&args, i, "--rerank")?.parse::<RerankMethod>()?; i += 1; }
                    "--no-highlight" => params.enable_highlighting = false,
                    "--json" => json = true,
                    a if a.starts_with("--") => bail!("unknown flag {a}\n{USAGE}"),
                    a => positional.push(a.to_string()),
                }
                i += 1;
            }
            let Some(query) = positional.first() else { bail!("missing query\n{USAGE}") };
            let store = load_store(&config, positional.get(1).map(expand_path)).await?;
            let engine = SearchEngine::new(config.engine()?, Some(get_default_provider()))?;
            let resp = engine.search(query, &store, None, &params).await?;
            if json { println!("{}", serde_json::to_string_pretty(&resp)?); } else { print_response(query, &resp); }
        }
        "similar" => {
            let threshold: f32 = match args.first() {
                Some(t) => t.parse().context("threshold must be a number")?,
                None => config.get_or("similar.threshold", 0.7)?,
            };
            let store = load_store(&config, args.get(1).map(expand_path)).await?;
            let pairs = similar_pairs(&store, threshold);
            println!("🔗 {} similar pairs (threshold {:.0}%)", pairs.len(), similarity_percent(threshold));
            for p in &pairs { println!("  {} ↔ {}  {:.1}%", p.first, p.second, similarity_percent(p.similarity)); }
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();
    tokio::runtime::Runtime::new()?.block_on(run())
}
