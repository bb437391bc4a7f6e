use std::collections::HashSet;

use super::{extremes, rate_entries, ArbPair};
use crate::types::{MarketMap, TimeWindow};

/// Long/short pair with the largest funding spread.
///
/// Long is the lowest-rate market, short the highest. Returns `None` with
/// fewer than two rated markets or when every rate is equal.
pub fn find_best_pair<'a>(
    markets: &'a MarketMap,
    window: TimeWindow,
    allowed_keys: Option<&HashSet<String>>,
) -> Option<ArbPair<'a>> {
    let entries = rate_entries(markets, window, allowed_keys);
    if entries.len() < 2 {
        return None;
    }
    let (min, max) = extremes(&entries)?;
    if min == max {
        return None;
    }
    Some(ArbPair::from_legs(entries[min], entries[max]))
}
