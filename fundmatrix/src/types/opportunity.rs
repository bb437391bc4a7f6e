use serde::{Deserialize, Serialize};

/// One side of a precomputed opportunity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArbLeg {
    pub exchange: String,
    pub quote: Option<String>,
    pub open_interest: Option<f64>,
    pub volume_24h: Option<f64>,
    pub url: Option<String>,
}

/// A long/short opportunity as computed by the arbitrage view for one
/// window: go long on `long`, short on `short`, earn `opportunity_apr`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawArbRow", into = "RawArbRow")]
pub struct ArbRow {
    pub base_asset: String,
    /// Window length in days, `0` for the current rate.
    pub window_days: u32,
    pub opportunity_apr: f64,
    pub long: ArbLeg,
    pub short: ArbLeg,
    pub open_interest: Option<f64>,
    pub volume_24h: Option<f64>,
}

impl ArbRow {
    pub fn new(base_asset: impl Into<String>, window_days: u32, opportunity_apr: f64) -> Self {
        Self {
            base_asset: base_asset.into(),
            window_days,
            opportunity_apr,
            ..Default::default()
        }
    }

    pub fn with_legs(mut self, long: ArbLeg, short: ArbLeg) -> Self {
        self.long = long;
        self.short = short;
        self
    }
}

impl ArbLeg {
    pub fn new(exchange: impl Into<String>, quote: Option<&str>) -> Self {
        Self {
            exchange: exchange.into(),
            quote: quote.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Flat row shape of the opportunities view: each leg's fields carry a
/// `long_` or `short_` prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawArbRow {
    #[serde(default)]
    base_asset: String,
    #[serde(default)]
    window_days: u32,
    #[serde(default)]
    opportunity_apr: Option<f64>,

    #[serde(default)]
    long_exchange: String,
    #[serde(default)]
    long_quote: Option<String>,
    #[serde(default)]
    long_open_interest: Option<f64>,
    #[serde(default)]
    long_volume_24h: Option<f64>,
    #[serde(default)]
    long_url: Option<String>,

    #[serde(default)]
    short_exchange: String,
    #[serde(default)]
    short_quote: Option<String>,
    #[serde(default)]
    short_open_interest: Option<f64>,
    #[serde(default)]
    short_volume_24h: Option<f64>,
    #[serde(default)]
    short_url: Option<String>,

    #[serde(default)]
    open_interest: Option<f64>,
    #[serde(default)]
    volume_24h: Option<f64>,
}

impl From<RawArbRow> for ArbRow {
    fn from(raw: RawArbRow) -> Self {
        ArbRow {
            base_asset: raw.base_asset,
            window_days: raw.window_days,
            opportunity_apr: raw.opportunity_apr.unwrap_or(f64::NAN),
            long: ArbLeg {
                exchange: raw.long_exchange,
                quote: raw.long_quote,
                open_interest: raw.long_open_interest,
                volume_24h: raw.long_volume_24h,
                url: raw.long_url,
            },
            short: ArbLeg {
                exchange: raw.short_exchange,
                quote: raw.short_quote,
                open_interest: raw.short_open_interest,
                volume_24h: raw.short_volume_24h,
                url: raw.short_url,
            },
            open_interest: raw.open_interest,
            volume_24h: raw.volume_24h,
        }
    }
}

impl From<ArbRow> for RawArbRow {
    fn from(row: ArbRow) -> Self {
        RawArbRow {
            base_asset: row.base_asset,
            window_days: row.window_days,
            opportunity_apr: Some(row.opportunity_apr).filter(|apr| apr.is_finite()),
            long_exchange: row.long.exchange,
            long_quote: row.long.quote,
            long_open_interest: row.long.open_interest,
            long_volume_24h: row.long.volume_24h,
            long_url: row.long.url,
            short_exchange: row.short.exchange,
            short_quote: row.short.quote,
            short_open_interest: row.short.open_interest,
            short_volume_24h: row.short.volume_24h,
            short_url: row.short.url,
            open_interest: row.open_interest,
            volume_24h: row.volume_24h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_view_row() {
        let json = r#"{
            "base_asset": "ETH",
            "window_days": 7,
            "opportunity_apr": 14.2,
            "short_exchange": "binance",
            "short_quote": "USDT",
            "short_open_interest": 8250000000,
            "short_volume_24h": null,
            "short_url": "https://www.binance.com/en/futures/ETHUSDT",
            "long_exchange": "hyperliquid",
            "long_quote": "USDC",
            "open_interest": 9000000000,
            "volume_24h": 2.5e10
        }"#;
        let row: ArbRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.base_asset, "ETH");
        assert_eq!(row.window_days, 7);
        assert_eq!(row.opportunity_apr, 14.2);
        assert_eq!(row.short.exchange, "binance");
        assert_eq!(row.short.open_interest, Some(8_250_000_000.0));
        assert_eq!(row.short.volume_24h, None);
        assert!(row.short.url.as_deref().unwrap().ends_with("ETHUSDT"));
        assert_eq!(row.long.exchange, "hyperliquid");
        assert_eq!(row.long.quote.as_deref(), Some("USDC"));
        assert_eq!(row.long.url, None);
        assert_eq!(row.volume_24h, Some(25_000_000_000.0));
    }

    #[test]
    fn test_null_apr_is_nan() {
        let row: ArbRow =
            serde_json::from_str(r#"{"base_asset": "WIF", "opportunity_apr": null}"#).unwrap();
        assert!(row.opportunity_apr.is_nan());
        let v = serde_json::to_value(&row).unwrap();
        assert!(v["opportunity_apr"].is_null());
    }

    #[test]
    fn test_serialize_flattens_legs() {
        let row = ArbRow::new("SOL", 1, 8.0)
            .with_legs(ArbLeg::new("okx", Some("USDT")), ArbLeg::new("bybit", None));
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["long_exchange"], "okx");
        assert_eq!(v["long_quote"], "USDT");
        assert_eq!(v["short_exchange"], "bybit");
        assert!(v["short_quote"].is_null());
        assert_eq!(v["window_days"], 1);
    }
}
