//! Loading dashboard data from a [`RowSource`] or an [`RpcSource`].
//!
//! Tables are read page by page. Each load is guarded by a timeout and a
//! timed-out load is retried a bounded number of times; any other failure is
//! returned as is.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::{ArbChartParams, FundingChartParams};
use crate::config::ScreenerConfig;
use crate::error::{FundmatrixError, Result};
use crate::opportunities::OpportunityCache;
use crate::source::{rpc, tables, Filter, OrderBy, PageRequest, RowSource, RpcSource};
use crate::types::{ArbRow, ChartPoint, ExchangeColumn, FundingRow, ScreenerSnapshot, TimeWindow, TokenRow};

/// Read every row of `table`, `page_size` rows per request.
///
/// Stops at the first empty page or the first page shorter than
/// `page_size`.
///
/// # Errors
///
/// Returns `FundmatrixError::Validation` if `page_size` is zero, otherwise
/// the first error of the source.
pub async fn fetch_all<S, T>(
    source: &S,
    table: &str,
    order: Option<OrderBy>,
    page_size: usize,
) -> Result<Vec<T>>
where
    S: RowSource,
    T: DeserializeOwned + Send,
{
    fetch_where(source, table, None, order, page_size).await
}

/// [`fetch_all`] restricted to rows matching `filter`.
pub async fn fetch_where<S, T>(
    source: &S,
    table: &str,
    filter: Option<Filter>,
    order: Option<OrderBy>,
    page_size: usize,
) -> Result<Vec<T>>
where
    S: RowSource,
    T: DeserializeOwned + Send,
{
    if page_size == 0 {
        return Err(FundmatrixError::Validation("page size must be positive".into()));
    }

    let mut out = Vec::new();
    let mut from = 0usize;
    loop {
        let req = PageRequest {
            table: table.to_string(),
            filter: filter.clone(),
            order: order.clone(),
            from,
            to: from + page_size - 1,
        };
        let page: Vec<T> = source.fetch_page(&req).await?;
        let n = page.len();
        debug!(table, from, rows = n, "page fetched");
        out.extend(page);
        if n < page_size {
            break;
        }
        from += page_size;
    }
    Ok(out)
}

/// Run `fut`, failing with `FundmatrixError::Timeout` after `duration`.
pub async fn with_timeout<F, T>(duration: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(FundmatrixError::Timeout(duration)),
    }
}

/// Call `op` until it succeeds, fails with a non-timeout error, or
/// `max_attempts` attempts have been made. At least one attempt is made.
pub async fn fetch_with_retry<F, Fut, T>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_timeout() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "load timed out, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Load the column list and all matrix rows.
///
/// Both tables are fetched concurrently; the pair shares one timeout per
/// attempt and is retried together.
pub async fn load_screener<S: RowSource>(source: &S, config: &ScreenerConfig) -> Result<ScreenerSnapshot> {
    let page_size = config.page_size;
    let timeout = config.request_timeout;

    let (columns, rows) = fetch_with_retry(config.max_attempts, || async move {
        let columns = with_timeout(
            timeout,
            fetch_all::<S, ExchangeColumn>(
                source,
                tables::EXCHANGE_COLUMNS,
                Some(OrderBy::asc("column_key")),
                page_size,
            ),
        );
        let rows = with_timeout(
            timeout,
            fetch_all::<S, TokenRow>(source, tables::FUNDING_MATRIX, None, page_size),
        );
        futures_util::future::try_join(columns, rows).await
    })
    .await?;

    info!(columns = columns.len(), rows = rows.len(), "screener data loaded");
    Ok(ScreenerSnapshot {
        generated_at: Some(chrono::Utc::now()),
        columns,
        rows,
    })
}

/// Read a whole table under the configured page size, timeout and retry.
async fn load_table<S, T>(
    source: &S,
    table: &str,
    filter: Option<Filter>,
    order: Option<OrderBy>,
    config: &ScreenerConfig,
) -> Result<Vec<T>>
where
    S: RowSource,
    T: DeserializeOwned + Send,
{
    let page_size = config.page_size;
    let timeout = config.request_timeout;
    fetch_with_retry(config.max_attempts, || {
        with_timeout(
            timeout,
            fetch_where(source, table, filter.clone(), order.clone(), page_size),
        )
    })
    .await
}

/// Load the opportunities of one window, best APR first.
pub async fn load_opportunities<S: RowSource>(
    source: &S,
    window: TimeWindow,
    config: &ScreenerConfig,
) -> Result<Vec<ArbRow>> {
    let rows: Vec<ArbRow> = load_table(
        source,
        tables::ARB_OPPORTUNITIES,
        Some(Filter::eq("window_days", window.days())),
        Some(OrderBy::desc("opportunity_apr")),
        config,
    )
    .await?;
    info!(window = %window, rows = rows.len(), "opportunities loaded");
    Ok(rows)
}

/// Opportunities of `window`, served from `cache` while younger than
/// `config.cache_max_age`.
///
/// Returns `Ok(None)` when a newer load of the same window began while this
/// one was in flight; its rows are dropped.
pub async fn load_opportunities_cached<S: RowSource>(
    source: &S,
    window: TimeWindow,
    config: &ScreenerConfig,
    cache: &OpportunityCache,
) -> Result<Option<Arc<Vec<ArbRow>>>> {
    if let Some(rows) = cache.get(&window, Some(config.cache_max_age)) {
        debug!(window = %window, rows = rows.len(), "opportunities served from cache");
        return Ok(Some(rows));
    }
    let ticket = cache.begin(window);
    let rows = load_opportunities(source, window, config).await?;
    if !cache.complete(ticket, rows) {
        return Ok(None);
    }
    Ok(cache.get(&window, None))
}

/// Load the per-market funding dashboard, highest 24h volume first.
pub async fn load_funding_rows<S: RowSource>(source: &S, config: &ScreenerConfig) -> Result<Vec<FundingRow>> {
    let rows: Vec<FundingRow> = load_table(
        source,
        tables::FUNDING_DASHBOARD,
        None,
        Some(OrderBy::desc("volume_24h")),
        config,
    )
    .await?;
    info!(rows = rows.len(), "funding rows loaded");
    Ok(rows)
}

/// Call a chart procedure; a null result reads as no points.
async fn load_chart<S, P>(source: &S, function: &str, params: &P, config: &ScreenerConfig) -> Result<Vec<ChartPoint>>
where
    S: RpcSource,
    P: Serialize,
{
    let params = serde_json::to_value(params)?;
    let timeout = config.request_timeout;
    let points: Option<Vec<ChartPoint>> = fetch_with_retry(config.max_attempts, || {
        with_timeout(timeout, source.call(function, &params))
    })
    .await?;
    let points = points.unwrap_or_default();
    info!(function, points = points.len(), "chart loaded");
    Ok(points)
}

/// Funding-rate history of one market.
pub async fn load_funding_chart<S: RpcSource>(
    source: &S,
    params: &FundingChartParams,
    config: &ScreenerConfig,
) -> Result<Vec<ChartPoint>> {
    load_chart(source, rpc::FUNDING_CHART, params, config).await
}

/// Spread history of one long/short pair.
pub async fn load_arb_chart<S: RpcSource>(
    source: &S,
    params: &ArbChartParams,
    config: &ScreenerConfig,
) -> Result<Vec<ChartPoint>> {
    load_chart(source, rpc::ARB_CHART, params, config).await
}
