use std::collections::HashSet;

use super::{extremes, find_best_pair, rate_entries, ArbPair, RateEntry};
use crate::rate::get_rate;
use crate::types::{MarketMap, TimeWindow};

/// Best pair that keeps `pinned_key` as one of its legs.
///
/// The pin is paired against the highest other rate (pin goes long) and
/// against the lowest other rate (pin goes short); the larger spread wins,
/// with ties going to the pin-long side. Returns `None` if neither side
/// gives a positive spread.
///
/// Falls back to [`find_best_pair`] when there is no pin, the pin is
/// filtered out by `allowed_keys`, or the pinned market has no rate for
/// `window`.
pub fn find_best_pair_pinned<'a>(
    markets: &'a MarketMap,
    window: TimeWindow,
    allowed_keys: Option<&HashSet<String>>,
    pinned_key: Option<&str>,
) -> Option<ArbPair<'a>> {
    let Some(pinned_key) = pinned_key else {
        return find_best_pair(markets, window, allowed_keys);
    };
    if allowed_keys.is_some_and(|keys| !keys.contains(pinned_key)) {
        return find_best_pair(markets, window, allowed_keys);
    }
    let pinned = markets.get_key_value(pinned_key).and_then(|(key, market)| {
        get_rate(Some(market), window).map(|rate| RateEntry {
            key: key.as_str(),
            market,
            rate,
        })
    });
    let Some(pinned) = pinned else {
        return find_best_pair(markets, window, allowed_keys);
    };

    let others: Vec<RateEntry<'a>> = rate_entries(markets, window, allowed_keys)
        .into_iter()
        .filter(|e| e.key != pinned_key)
        .collect();
    let (min, max) = extremes(&others)?;
    let (min_other, max_other) = (others[min], others[max]);

    let spread_if_pinned_long = max_other.rate - pinned.rate;
    let spread_if_pinned_short = pinned.rate - min_other.rate;

    if spread_if_pinned_long >= spread_if_pinned_short {
        (spread_if_pinned_long > 0.0).then(|| ArbPair::from_legs(pinned, max_other))
    } else {
        (spread_if_pinned_short > 0.0).then(|| ArbPair::from_legs(min_other, pinned))
    }
}
