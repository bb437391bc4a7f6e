use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::TimeWindow;

/// One exchange + quote-asset listing of a token.
///
/// Rates are annualized funding percentages. A window with no entry in
/// `rates` is unknown, which is distinct from a recorded `0.0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawMarket", into = "RawMarket")]
pub struct Market {
    pub exchange: String,
    pub quote: Option<String>,
    pub rates: BTreeMap<TimeWindow, f64>,
    pub ref_url: Option<String>,
    pub open_interest: Option<f64>,
    pub volume_24h: Option<f64>,
}

impl Market {
    pub fn new(exchange: impl Into<String>, quote: Option<&str>) -> Self {
        Self {
            exchange: exchange.into(),
            quote: quote.map(str::to_string),
            ..Default::default()
        }
    }

    /// Record a rate for `window`. Non-finite values are not stored.
    pub fn with_rate(mut self, window: TimeWindow, rate: f64) -> Self {
        if rate.is_finite() {
            self.rates.insert(window, rate);
        }
        self
    }

    pub fn with_ref_url(mut self, url: impl Into<String>) -> Self {
        self.ref_url = Some(url.into());
        self
    }

    /// The stored rate for `window`, if any.
    pub fn rate(&self, window: TimeWindow) -> Option<f64> {
        self.rates.get(&window).copied()
    }

    /// Exchange id with the quote asset appended, lower-cased
    /// (e.g. `binanceusdt`). `None` if either part is missing.
    pub fn composite_id(&self) -> Option<String> {
        let quote = self.quote.as_deref().filter(|q| !q.is_empty())?;
        if self.exchange.is_empty() {
            return None;
        }
        Some(format!("{}{}", self.exchange, quote).to_lowercase())
    }
}

/// Row shape of a market inside the funding matrix view: one nullable
/// column per window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMarket {
    #[serde(default)]
    exchange: String,
    #[serde(default)]
    quote: Option<String>,
    #[serde(default)]
    ref_url: Option<String>,
    #[serde(default)]
    open_interest: Option<f64>,
    #[serde(default)]
    volume_24h: Option<f64>,
    #[serde(default)]
    now: Option<f64>,
    #[serde(default, rename = "1d")]
    day1: Option<f64>,
    #[serde(default, rename = "3d")]
    day3: Option<f64>,
    #[serde(default, rename = "7d")]
    day7: Option<f64>,
    #[serde(default, rename = "15d")]
    day15: Option<f64>,
    #[serde(default, rename = "30d")]
    day30: Option<f64>,
}

impl RawMarket {
    fn slot(&mut self, window: TimeWindow) -> &mut Option<f64> {
        match window {
            TimeWindow::Now => &mut self.now,
            TimeWindow::Day1 => &mut self.day1,
            TimeWindow::Day3 => &mut self.day3,
            TimeWindow::Day7 => &mut self.day7,
            TimeWindow::Day15 => &mut self.day15,
            TimeWindow::Day30 => &mut self.day30,
        }
    }
}

impl From<RawMarket> for Market {
    fn from(mut raw: RawMarket) -> Self {
        let mut rates = BTreeMap::new();
        for window in TimeWindow::ALL {
            if let Some(rate) = raw.slot(window).take().filter(|r| r.is_finite()) {
                rates.insert(window, rate);
            }
        }
        Market {
            exchange: raw.exchange,
            quote: raw.quote,
            rates,
            ref_url: raw.ref_url,
            open_interest: raw.open_interest,
            volume_24h: raw.volume_24h,
        }
    }
}

impl From<Market> for RawMarket {
    fn from(market: Market) -> Self {
        let mut raw = RawMarket {
            exchange: market.exchange,
            quote: market.quote,
            ref_url: market.ref_url,
            open_interest: market.open_interest,
            volume_24h: market.volume_24h,
            ..Default::default()
        };
        for (window, rate) in market.rates {
            *raw.slot(window) = Some(rate);
        }
        raw
    }
}
