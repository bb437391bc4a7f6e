//! Screener pipeline over a funding-matrix snapshot.
//!
//! Filters rows by search prefix and minimum spread, ranks them, and attaches
//! the best (optionally pinned) arbitrage pair and its backtest link.

use std::cmp::Ordering;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::arb::{find_best_pair_pinned, max_spread, ArbPair};
use crate::columns::allowed_keys;
use crate::error::FundmatrixError;
use crate::link::BacktestLinkBuilder;
use crate::symbol::SymbolNormalizer;
use crate::types::{ExchangeColumn, TimeWindow, TokenRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Token,
    #[default]
    MaxArb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// User-selected screener parameters.
#[derive(Debug, Clone, Default)]
pub struct ScreenerQuery {
    /// Token search; matched as a normalized prefix. Blank matches all.
    pub search: String,
    pub window: TimeWindow,
    /// Exchange filter; empty means every exchange.
    pub exchanges: Vec<String>,
    /// Minimum max-spread (APR %) a row needs; ignored unless positive.
    pub min_apr: Option<f64>,
    pub sort: SortKey,
    pub direction: SortDirection,
    /// Market key held as one leg of every pair.
    pub pinned: Option<String>,
}

/// One ranked row of the screener.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenedRow<'a> {
    pub token: &'a str,
    pub max_spread: Option<f64>,
    pub pair: Option<ArbPair<'a>>,
    pub backtest_url: Option<Url>,
}

/// Run the screener over `rows`.
pub fn screen<'a>(
    rows: &'a [TokenRow],
    columns: &[ExchangeColumn],
    query: &ScreenerQuery,
    normalizer: &SymbolNormalizer,
    links: &BacktestLinkBuilder,
) -> Vec<ScreenedRow<'a>> {
    let allowed = allowed_keys(columns, &query.exchanges);
    let search = query.search.trim();
    let min_apr = query.min_apr.filter(|m| *m > 0.0);

    let mut out: Vec<ScreenedRow<'a>> = rows
        .iter()
        .filter(|row| search.is_empty() || normalizer.matches(&row.token, search))
        .map(|row| {
            let pair = find_best_pair_pinned(
                &row.markets,
                query.window,
                allowed.as_ref(),
                query.pinned.as_deref(),
            );
            ScreenedRow {
                token: row.token.as_str(),
                max_spread: max_spread(&row.markets, query.window, allowed.as_ref()),
                backtest_url: links.build(&row.token, pair.as_ref()),
                pair,
            }
        })
        .filter(|r| min_apr.map_or(true, |min| r.max_spread.is_some_and(|s| s >= min)))
        .collect();

    sort_rows(&mut out, query.sort, query.direction);
    out
}

/// Stable sort; a missing spread ranks below every present one.
pub fn sort_rows(rows: &mut [ScreenedRow<'_>], key: SortKey, direction: SortDirection) {
    let compare = |a: &ScreenedRow<'_>, b: &ScreenedRow<'_>| -> Ordering {
        match key {
            SortKey::Token => a.token.cmp(b.token),
            SortKey::MaxArb => spread_key(a).cmp(&spread_key(b)),
        }
    };
    match direction {
        SortDirection::Asc => rows.sort_by(compare),
        SortDirection::Desc => rows.sort_by(|a, b| compare(b, a)),
    }
}

fn spread_key(row: &ScreenedRow<'_>) -> OrderedFloat<f64> {
    OrderedFloat(row.max_spread.unwrap_or(f64::NEG_INFINITY))
}

/// Rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Rows(usize),
    All,
}

impl Default for PageLimit {
    fn default() -> Self {
        PageLimit::Rows(20)
    }
}

impl FromStr for PageLimit {
    type Err = FundmatrixError;

    /// Accepts a positive row count, or `all` / `-1` for a single page.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s == "-1" {
            return Ok(PageLimit::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(PageLimit::Rows(n)),
            _ => Err(FundmatrixError::Validation(format!("invalid page limit: {s}"))),
        }
    }
}

/// Number of pages; never less than one.
pub fn total_pages(len: usize, limit: PageLimit) -> usize {
    match limit {
        PageLimit::All => 1,
        PageLimit::Rows(n) => len.div_ceil(n).max(1),
    }
}

/// The slice shown on zero-based `page`; empty past the end.
pub fn paginate<T>(items: &[T], limit: PageLimit, page: usize) -> &[T] {
    match limit {
        PageLimit::All => items,
        PageLimit::Rows(n) => {
            let start = page.saturating_mul(n).min(items.len());
            let end = start.saturating_add(n).min(items.len());
            &items[start..end]
        }
    }
}
