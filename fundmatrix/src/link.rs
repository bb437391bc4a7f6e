//! Deep links into the external backtesting tool.
//!
//! The tool reads three query parameters: `token`, `exchange1` (long leg) and
//! `exchange2` (short leg), each exchange given as lower-case
//! `exchange + quote` (e.g. `binanceusdt`).

use url::Url;

use crate::arb::ArbPair;
use crate::error::Result;

/// Builds backtest URLs on top of a fixed base URL.
#[derive(Debug, Clone)]
pub struct BacktestLinkBuilder {
    base: Url,
}

impl BacktestLinkBuilder {
    /// # Errors
    ///
    /// Returns `FundmatrixError::Url` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Backtest URL for `token` and `pair`.
    ///
    /// `None` when there is no pair or either leg is missing its exchange or
    /// quote asset.
    pub fn build(&self, token: &str, pair: Option<&ArbPair<'_>>) -> Option<Url> {
        let pair = pair?;
        let exchange1 = pair.long_market.composite_id()?;
        let exchange2 = pair.short_market.composite_id()?;

        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("exchange1", &exchange1)
            .append_pair("exchange2", &exchange2);
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Market, TimeWindow};

    fn pair<'a>(long: &'a Market, short: &'a Market) -> ArbPair<'a> {
        let long_rate = long.rate(TimeWindow::Now).unwrap_or(0.0);
        let short_rate = short.rate(TimeWindow::Now).unwrap_or(1.0);
        ArbPair {
            long_key: "long",
            long_market: long,
            long_rate,
            short_key: "short",
            short_market: short,
            short_rate,
            spread: short_rate - long_rate,
        }
    }

    fn builder() -> BacktestLinkBuilder {
        BacktestLinkBuilder::new("https://bendbasis.com/backtester").unwrap()
    }

    #[test]
    fn test_builds_query_contract() {
        let long = Market::new("binance", Some("USDT"));
        let short = Market::new("bybit", Some("USDT"));
        let url = builder().build("ETH", Some(&pair(&long, &short))).unwrap();
        assert!(
            url.as_str()
                .contains("token=ETH&exchange1=binanceusdt&exchange2=bybitusdt"),
            "unexpected url: {url}"
        );
        assert_eq!(url.path(), "/backtester");
    }

    #[test]
    fn test_no_pair() {
        assert!(builder().build("ETH", None).is_none());
    }

    #[test]
    fn test_missing_quote_or_exchange() {
        let long = Market::new("binance", None);
        let short = Market::new("bybit", Some("USDT"));
        assert!(builder().build("ETH", Some(&pair(&long, &short))).is_none());

        let long = Market::new("", Some("USDT"));
        assert!(builder().build("ETH", Some(&pair(&long, &short))).is_none());
    }

    #[test]
    fn test_percent_encodes_token() {
        let long = Market::new("hyperliquid", Some("USDC"));
        let short = Market::new("paradex", Some("USD"));
        let url = builder()
            .build("1000 PEPE&x", Some(&pair(&long, &short)))
            .unwrap();
        let token = url
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned());
        assert_eq!(token.as_deref(), Some("1000 PEPE&x"));
        assert!(!url.as_str().contains("PEPE&x"));
        assert!(url.as_str().contains("exchange1=hyperliquidusdc&exchange2=paradexusd"));
    }

    #[test]
    fn test_keeps_base_query() {
        let b = BacktestLinkBuilder::new("https://example.com/bt?ref=screener").unwrap();
        let long = Market::new("okx", Some("USDT"));
        let short = Market::new("gate", Some("USDT"));
        let url = b.build("SOL", Some(&pair(&long, &short))).unwrap();
        assert_eq!(
            url.query(),
            Some("ref=screener&token=SOL&exchange1=okxusdt&exchange2=gateusdt")
        );
        // Building never touches the base.
        assert_eq!(b.base_url().query(), Some("ref=screener"));
    }

    #[test]
    fn test_rejects_relative_base() {
        assert!(BacktestLinkBuilder::new("/backtester").is_err());
    }
}
