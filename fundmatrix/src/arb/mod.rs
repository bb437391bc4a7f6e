//! Cross-exchange funding arbitrage: spread and long/short pair selection.
//!
//! Every function here takes the markets of one token, a time window and an
//! optional set of allowed market keys (the exchange filter). Markets outside
//! the set, or without a finite rate for the window, are ignored.
//!
//! Scans follow the key order of [`MarketMap`] and use strict comparisons, so
//! the first market encountered wins a tie for the minimum or the maximum.

mod pair;
mod pinned;
mod spread;

use std::collections::HashSet;

use serde::Serialize;

use crate::rate::get_rate;
use crate::types::{Market, MarketMap, TimeWindow};

pub use pair::find_best_pair;
pub use pinned::find_best_pair_pinned;
pub use spread::max_spread;

/// A long/short funding arbitrage between two markets of the same token.
///
/// The long leg is the lower rate (pays less funding), the short leg the
/// higher one (receives more). `spread = short_rate - long_rate` and is
/// always positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbPair<'a> {
    pub long_key: &'a str,
    pub long_market: &'a Market,
    pub long_rate: f64,
    pub short_key: &'a str,
    pub short_market: &'a Market,
    pub short_rate: f64,
    pub spread: f64,
}

/// A market that passed the filter and has a rate for the window.
#[derive(Debug, Clone, Copy)]
struct RateEntry<'a> {
    key: &'a str,
    market: &'a Market,
    rate: f64,
}

impl<'a> ArbPair<'a> {
    fn from_legs(long: RateEntry<'a>, short: RateEntry<'a>) -> Self {
        ArbPair {
            long_key: long.key,
            long_market: long.market,
            long_rate: long.rate,
            short_key: short.key,
            short_market: short.market,
            short_rate: short.rate,
            spread: short.rate - long.rate,
        }
    }
}

fn rate_entries<'a>(
    markets: &'a MarketMap,
    window: TimeWindow,
    allowed_keys: Option<&HashSet<String>>,
) -> Vec<RateEntry<'a>> {
    markets
        .iter()
        .filter(|(key, _)| allowed_keys.map_or(true, |keys| keys.contains(key.as_str())))
        .filter_map(|(key, market)| {
            get_rate(Some(market), window).map(|rate| RateEntry {
                key: key.as_str(),
                market,
                rate,
            })
        })
        .collect()
}

/// Indices of the minimum and maximum rate, first match winning ties.
fn extremes(entries: &[RateEntry<'_>]) -> Option<(usize, usize)> {
    let first = entries.first()?;
    let (mut min_idx, mut max_idx) = (0, 0);
    let (mut min_rate, mut max_rate) = (first.rate, first.rate);
    for (idx, entry) in entries.iter().enumerate().skip(1) {
        if entry.rate < min_rate {
            min_idx = idx;
            min_rate = entry.rate;
        }
        if entry.rate > max_rate {
            max_idx = idx;
            max_rate = entry.rate;
        }
    }
    Some((min_idx, max_idx))
}
