//! Integration tests for loading a snapshot through the paged loader and the
//! generation cache.

use std::path::PathBuf;
use std::sync::Arc;

use fundmatrix::source::tables;
use fundmatrix::*;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot.json")
}

fn config(page_size: usize) -> ScreenerConfig {
    ScreenerConfig {
        page_size,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_load_from_file_across_pages() {
    let source = SnapshotSource::open(fixture_path()).await.unwrap();
    let snap = load_screener(&source, &config(2)).await.unwrap();

    let keys: Vec<&str> = snap.columns.iter().map(|c| c.column_key.as_str()).collect();
    assert_eq!(keys, vec!["binance", "bybit", "hyperliquid", "okx", "paradex"]);

    // Rows keep the payload order.
    let tokens: Vec<&str> = snap.rows.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(tokens, vec!["ETH", "1000PEPE", "PENDLE", "BTC", "WIF"]);
}

#[tokio::test]
async fn test_page_size_does_not_change_result() {
    let source = SnapshotSource::open(fixture_path()).await.unwrap();
    let small = load_screener(&source, &config(1)).await.unwrap();
    let large = load_screener(&source, &config(1000)).await.unwrap();
    assert_eq!(small.columns, large.columns);
    assert_eq!(small.rows, large.rows);
}

#[tokio::test]
async fn test_fetch_all_exact_multiple() {
    let source = SnapshotSource::open(fixture_path()).await.unwrap();
    let rows: Vec<TokenRow> = fetch_all(&source, tables::FUNDING_MATRIX, None, 5).await.unwrap();
    assert_eq!(rows.len(), 5);
}

#[tokio::test]
async fn test_unknown_table() {
    let source = SnapshotSource::open(fixture_path()).await.unwrap();
    let res: Result<Vec<TokenRow>> = fetch_all(&source, "funding_history", None, 10).await;
    assert!(matches!(res, Err(FundmatrixError::UnknownTable(_))));
}

#[tokio::test]
async fn test_cached_loads_per_window() {
    let source = SnapshotSource::open(fixture_path()).await.unwrap();
    let cache: Arc<GenerationCache<TimeWindow, ScreenerSnapshot>> = Arc::new(GenerationCache::new());

    let slow = cache.begin(TimeWindow::Now);
    let fast = cache.begin(TimeWindow::Now);
    let snap = load_screener(&source, &config(1000)).await.unwrap();

    assert!(cache.complete(fast, snap.clone()));
    assert!(!cache.complete(slow, ScreenerSnapshot::default()));

    let cached = cache.get(&TimeWindow::Now, Some(config(1000).cache_max_age)).unwrap();
    assert_eq!(cached.rows.len(), 5);
    assert!(cache.get(&TimeWindow::Day7, None).is_none());
}
