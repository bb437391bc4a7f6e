//! Arbitrage-opportunities view.
//!
//! The backend precomputes long/short opportunities per token and window.
//! This module filters and ranks a loaded window; loading and the
//! per-window cache live in [`crate::fetch`].

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;

use crate::cache::GenerationCache;
use crate::screener::SortDirection;
use crate::symbol::SymbolNormalizer;
use crate::types::{ArbRow, TimeWindow};

/// Loaded opportunities keyed by window.
pub type OpportunityCache = GenerationCache<TimeWindow, Vec<ArbRow>>;

/// User-selected filters of the opportunities view.
#[derive(Debug, Clone, Default)]
pub struct OpportunityQuery {
    /// Base-asset search; matched as a normalized prefix. Blank matches all.
    pub search: String,
    /// Exchanges both legs must trade on; empty means every exchange.
    pub exchanges: Vec<String>,
    pub direction: SortDirection,
}

/// Distinct exchanges across both legs, sorted.
pub fn leg_exchanges(rows: &[ArbRow]) -> Vec<String> {
    rows.iter()
        .flat_map(|r| [r.long.exchange.as_str(), r.short.exchange.as_str()])
        .filter(|e| !e.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Whether both legs of `row` trade on a selected exchange.
pub fn legs_selected(row: &ArbRow, exchanges: &[String]) -> bool {
    exchanges.is_empty()
        || (exchanges.contains(&row.long.exchange) && exchanges.contains(&row.short.exchange))
}

/// Apply search and exchange filter, then rank by opportunity APR.
pub fn filter_opportunities<'a>(
    rows: &'a [ArbRow],
    query: &OpportunityQuery,
    normalizer: &SymbolNormalizer,
) -> Vec<&'a ArbRow> {
    let search = query.search.trim();
    let mut out: Vec<&ArbRow> = rows
        .iter()
        .filter(|r| search.is_empty() || normalizer.matches(&r.base_asset, search))
        .filter(|r| legs_selected(r, &query.exchanges))
        .collect();
    sort_opportunities(&mut out, query.direction);
    out
}

/// Stable sort by APR; a NaN APR ranks below every number.
pub fn sort_opportunities(rows: &mut [&ArbRow], direction: SortDirection) {
    let key = |r: &&ArbRow| OrderedFloat(apr_key(r.opportunity_apr));
    match direction {
        SortDirection::Asc => rows.sort_by_key(key),
        SortDirection::Desc => rows.sort_by(|a, b| key(b).cmp(&key(a))),
    }
}

fn apr_key(apr: f64) -> f64 {
    if apr.is_nan() {
        f64::NEG_INFINITY
    } else {
        apr
    }
}
