use crate::types::{Market, TimeWindow};

/// Funding rate of `market` for `window`.
///
/// `None` when the market is missing, has no rate for the window, or the
/// stored value is not finite. Never returns NaN.
pub fn get_rate(market: Option<&Market>, window: TimeWindow) -> Option<f64> {
    market?.rate(window).filter(|r| r.is_finite())
}
