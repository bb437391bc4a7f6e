use std::collections::HashSet;

use super::{extremes, rate_entries};
use crate::types::{MarketMap, TimeWindow};

/// Largest funding spread (`max rate - min rate`) across the token's markets.
///
/// `None` unless at least two allowed markets have a rate for `window`.
/// The result is never negative.
pub fn max_spread(
    markets: &MarketMap,
    window: TimeWindow,
    allowed_keys: Option<&HashSet<String>>,
) -> Option<f64> {
    let entries = rate_entries(markets, window, allowed_keys);
    if entries.len() < 2 {
        return None;
    }
    let (min, max) = extremes(&entries)?;
    Some(entries[max].rate - entries[min].rate)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{keys, markets};
    use super::*;

    #[test]
    fn test_empty_and_single() {
        assert_eq!(max_spread(&MarketMap::new(), TimeWindow::Now, None), None);
        let one = markets(&[("binance", Some(4.0))]);
        assert_eq!(max_spread(&one, TimeWindow::Now, None), None);
    }

    #[test]
    fn test_absent_rates_do_not_count() {
        let m = markets(&[("binance", Some(4.0)), ("bybit", None)]);
        assert_eq!(max_spread(&m, TimeWindow::Now, None), None);
    }

    #[test]
    fn test_basic_spread() {
        let m = markets(&[("binance", Some(4.0)), ("bybit", Some(-2.5)), ("okx", Some(1.0))]);
        assert_eq!(max_spread(&m, TimeWindow::Now, None), Some(6.5));
    }

    #[test]
    fn test_equal_rates_give_zero() {
        let m = markets(&[("a", Some(5.0)), ("b", Some(5.0))]);
        assert_eq!(max_spread(&m, TimeWindow::Now, None), Some(0.0));
    }

    #[test]
    fn test_allowed_keys_filter() {
        let m = markets(&[("binance", Some(4.0)), ("bybit", Some(-2.5)), ("okx", Some(1.0))]);
        let allowed = keys(&["binance", "okx"]);
        assert_eq!(max_spread(&m, TimeWindow::Now, Some(&allowed)), Some(3.0));

        let only_one = keys(&["okx", "gate"]);
        assert_eq!(max_spread(&m, TimeWindow::Now, Some(&only_one)), None);
    }

    #[test]
    fn test_other_window_ignored() {
        let m = markets(&[("binance", Some(4.0)), ("bybit", Some(-2.5))]);
        assert_eq!(max_spread(&m, TimeWindow::Day30, None), None);
    }
}
