//! Per-market funding table.
//!
//! Filters and ranks the rows of the funding dashboard: one row per exchange
//! listing, searched by market symbol prefix.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::screener::{PageLimit, SortDirection};
use crate::types::{FundingRow, TimeWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSortKey {
    /// 24h volume; the dashboard's own order.
    #[default]
    Volume,
    Market,
    /// Rate of the query window.
    Rate,
}

#[derive(Debug, Clone)]
pub struct FundingQuery {
    /// Case-insensitive market symbol prefix. Blank matches all.
    pub search: String,
    /// Exchange filter; empty means every exchange.
    pub exchanges: Vec<String>,
    pub window: TimeWindow,
    pub sort: FundingSortKey,
    pub direction: SortDirection,
    pub limit: PageLimit,
}

impl Default for FundingQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            exchanges: Vec::new(),
            window: TimeWindow::Now,
            sort: FundingSortKey::Volume,
            direction: SortDirection::Desc,
            limit: PageLimit::Rows(50),
        }
    }
}

/// Rows of the table: the first `limit` matches plus the match count.
#[derive(Debug, Clone)]
pub struct FundingTable<'a> {
    pub total: usize,
    pub rows: Vec<&'a FundingRow>,
}

/// Distinct exchanges, sorted.
pub fn funding_exchanges(rows: &[FundingRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.exchange.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Filter, sort and cut the funding rows.
pub fn funding_table<'a>(rows: &'a [FundingRow], query: &FundingQuery) -> FundingTable<'a> {
    let search = query.search.trim().to_lowercase();
    let mut matched: Vec<&FundingRow> = rows
        .iter()
        .filter(|r| search.is_empty() || r.market.to_lowercase().starts_with(&search))
        .filter(|r| query.exchanges.is_empty() || query.exchanges.contains(&r.exchange))
        .collect();
    sort_funding(&mut matched, query.sort, query.window, query.direction);

    let total = matched.len();
    if let PageLimit::Rows(n) = query.limit {
        matched.truncate(n);
    }
    FundingTable {
        total,
        rows: matched,
    }
}

/// Stable sort. Missing values sort last in both directions.
pub fn sort_funding(rows: &mut [&FundingRow], key: FundingSortKey, window: TimeWindow, direction: SortDirection) {
    let value = |r: &FundingRow| -> Option<OrderedFloat<f64>> {
        match key {
            FundingSortKey::Volume => r.volume_24h.filter(|v| !v.is_nan()).map(OrderedFloat),
            FundingSortKey::Rate => r.rate(window).map(OrderedFloat),
            FundingSortKey::Market => None,
        }
    };
    let compare = |a: &&FundingRow, b: &&FundingRow| -> Ordering {
        if key == FundingSortKey::Market {
            let ord = a.market.cmp(&b.market);
            return match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
        }
        match (value(a), value(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => match direction {
                SortDirection::Asc => x.cmp(&y),
                SortDirection::Desc => y.cmp(&x),
            },
        }
    };
    rows.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<FundingRow> {
        vec![
            FundingRow::new("bybit", "BTCUSDT")
                .with_rate(TimeWindow::Now, 10.0)
                .with_volume(9e9),
            FundingRow::new("binance", "BTCUSDT")
                .with_rate(TimeWindow::Now, 12.0)
                .with_volume(2e10),
            FundingRow::new("hyperliquid", "BTC").with_rate(TimeWindow::Now, -4.0),
            FundingRow::new("binance", "ETHUSDT")
                .with_rate(TimeWindow::Day7, 6.0)
                .with_volume(1e10),
            FundingRow::new("okx", "bonk-usdt-swap").with_volume(5e6),
        ]
    }

    fn markets<'a>(table: &FundingTable<'a>) -> Vec<(&'a str, &'a str)> {
        table
            .rows
            .iter()
            .map(|r| (r.exchange.as_str(), r.market.as_str()))
            .collect()
    }

    // ---- funding_table ----

    #[test]
    fn test_default_orders_by_volume_desc() {
        let rows = fixture();
        let t = funding_table(&rows, &FundingQuery::default());
        assert_eq!(t.total, 5);
        assert_eq!(
            markets(&t),
            vec![
                ("binance", "BTCUSDT"),
                ("binance", "ETHUSDT"),
                ("bybit", "BTCUSDT"),
                ("okx", "bonk-usdt-swap"),
                ("hyperliquid", "BTC"),
            ]
        );
    }

    #[test]
    fn test_market_prefix_search_is_case_insensitive() {
        let rows = fixture();
        let query = FundingQuery {
            search: " btc".into(),
            ..Default::default()
        };
        assert_eq!(funding_table(&rows, &query).total, 3);

        let query = FundingQuery {
            search: "BONK".into(),
            ..Default::default()
        };
        assert_eq!(markets(&funding_table(&rows, &query)), vec![("okx", "bonk-usdt-swap")]);

        // Prefix, not substring.
        let query = FundingQuery {
            search: "usdt".into(),
            ..Default::default()
        };
        assert_eq!(funding_table(&rows, &query).total, 0);
    }

    #[test]
    fn test_exchange_filter_and_limit() {
        let rows = fixture();
        let query = FundingQuery {
            exchanges: vec!["binance".into(), "bybit".into()],
            limit: PageLimit::Rows(2),
            ..Default::default()
        };
        let t = funding_table(&rows, &query);
        assert_eq!(t.total, 3);
        assert_eq!(markets(&t), vec![("binance", "BTCUSDT"), ("binance", "ETHUSDT")]);

        let query = FundingQuery {
            limit: PageLimit::All,
            ..query
        };
        assert_eq!(funding_table(&rows, &query).rows.len(), 3);
    }

    // ---- sort_funding ----

    #[test]
    fn test_sort_by_rate_missing_last() {
        let rows = fixture();
        let query = FundingQuery {
            sort: FundingSortKey::Rate,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let t = funding_table(&rows, &query);
        let got: Vec<Option<f64>> = t.rows.iter().map(|r| r.rate(TimeWindow::Now)).collect();
        assert_eq!(got, vec![Some(-4.0), Some(10.0), Some(12.0), None, None]);
    }

    #[test]
    fn test_sort_by_market() {
        let rows = fixture();
        let query = FundingQuery {
            sort: FundingSortKey::Market,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let t = funding_table(&rows, &query);
        assert_eq!(t.rows[0].market, "BTC");
        assert_eq!(t.rows[4].market, "bonk-usdt-swap");
    }

    #[test]
    fn test_funding_exchanges() {
        assert_eq!(
            funding_exchanges(&fixture()),
            vec!["binance", "bybit", "hyperliquid", "okx"]
        );
    }
}
