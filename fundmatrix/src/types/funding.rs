use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::TimeWindow;

/// One exchange listing of the per-market funding dashboard.
///
/// Unlike the matrix, the dashboard keeps one row per listing and carries
/// the backend's market id, which keys the funding chart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawFundingRow", into = "RawFundingRow")]
pub struct FundingRow {
    pub market_id: Option<i64>,
    pub exchange: String,
    /// Exchange symbol of the market (e.g. `BTCUSDT`).
    pub market: String,
    pub rates: BTreeMap<TimeWindow, f64>,
    pub ref_url: Option<String>,
    pub open_interest: Option<f64>,
    pub volume_24h: Option<f64>,
    pub updated: Option<String>,
}

impl FundingRow {
    pub fn new(exchange: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            market: market.into(),
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

    pub fn with_volume(mut self, volume_24h: f64) -> Self {
        self.volume_24h = Some(volume_24h);
        self
    }

    pub fn rate(&self, window: TimeWindow) -> Option<f64> {
        self.rates.get(&window).copied().filter(|r| r.is_finite())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawFundingRow {
    #[serde(default)]
    market_id: Option<i64>,
    #[serde(default)]
    exchange: String,
    #[serde(default)]
    market: String,
    #[serde(default)]
    ref_url: Option<String>,
    #[serde(default)]
    open_interest: Option<f64>,
    #[serde(default)]
    volume_24h: Option<f64>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default, alias = "now")]
    funding_rate_now: Option<f64>,
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

impl RawFundingRow {
    fn slot(&mut self, window: TimeWindow) -> &mut Option<f64> {
        match window {
            TimeWindow::Now => &mut self.funding_rate_now,
            TimeWindow::Day1 => &mut self.day1,
            TimeWindow::Day3 => &mut self.day3,
            TimeWindow::Day7 => &mut self.day7,
            TimeWindow::Day15 => &mut self.day15,
            TimeWindow::Day30 => &mut self.day30,
        }
    }
}

impl From<RawFundingRow> for FundingRow {
    fn from(mut raw: RawFundingRow) -> Self {
        let rates = TimeWindow::ALL
            .into_iter()
            .filter_map(|w| raw.slot(w).take().filter(|r| r.is_finite()).map(|r| (w, r)))
            .collect();
        FundingRow {
            market_id: raw.market_id,
            exchange: raw.exchange,
            market: raw.market,
            rates,
            ref_url: raw.ref_url,
            open_interest: raw.open_interest,
            volume_24h: raw.volume_24h,
            updated: raw.updated,
        }
    }
}

impl From<FundingRow> for RawFundingRow {
    fn from(row: FundingRow) -> Self {
        let mut raw = RawFundingRow {
            market_id: row.market_id,
            exchange: row.exchange,
            market: row.market,
            ref_url: row.ref_url,
            open_interest: row.open_interest,
            volume_24h: row.volume_24h,
            updated: row.updated,
            ..Default::default()
        };
        for (window, rate) in row.rates {
            *raw.slot(window) = Some(rate);
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_dashboard_row() {
        let json = r#"{
            "market_id": 4012,
            "exchange": "bybit",
            "market": "BTCUSDT",
            "funding_rate_now": 10.95,
            "1d": 8.1,
            "7d": null,
            "volume_24h": 1.25e10,
            "updated": "2025-06-01T11:59:00Z"
        }"#;
        let row: FundingRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.market_id, Some(4012));
        assert_eq!(row.market, "BTCUSDT");
        assert_eq!(row.rate(TimeWindow::Now), Some(10.95));
        assert_eq!(row.rate(TimeWindow::Day1), Some(8.1));
        assert_eq!(row.rate(TimeWindow::Day7), None);
        assert_eq!(row.volume_24h, Some(12_500_000_000.0));
        assert_eq!(row.open_interest, None);
    }

    #[test]
    fn test_now_alias() {
        let row: FundingRow = serde_json::from_str(r#"{"exchange": "okx", "now": -3.0}"#).unwrap();
        assert_eq!(row.rate(TimeWindow::Now), Some(-3.0));
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["funding_rate_now"], -3.0);
        assert!(v["market_id"].is_null());
    }
}
