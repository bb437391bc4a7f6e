//! Screener configuration.

use std::time::Duration;

use crate::symbol::LEGACY_MULTIPLIERS;

/// Default base URL of the external backtesting tool.
pub const DEFAULT_BACKTESTER_URL: &str = "https://bendbasis.com/backtester";

/// Rows requested per page from a row source.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// All tuneable parameters for loading and screening funding rows.
///
/// Use [`Default::default()`] for the production values and override fields
/// as needed.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Base URL the backtest deep links are built on.
    pub backtester_url: String,
    /// Magnitude multipliers stripped from tickers during search
    /// normalization. Empty when upstream symbols are pre-normalized.
    pub symbol_multipliers: Vec<String>,
    /// Rows requested per page.
    pub page_size: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Attempts per load; only timeouts are retried.
    pub max_attempts: u32,
    /// How long a cached load stays fresh.
    pub cache_max_age: Duration,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            backtester_url: DEFAULT_BACKTESTER_URL.to_string(),
            symbol_multipliers: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_millis(8000),
            max_attempts: 2,
            cache_max_age: Duration::from_secs(5 * 60),
        }
    }
}

impl ScreenerConfig {
    /// Configuration that strips the historical `1000`-style ticker
    /// multipliers, for feeds whose symbols are not pre-normalized.
    pub fn with_legacy_multipliers(mut self) -> Self {
        self.symbol_multipliers = LEGACY_MULTIPLIERS.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Parse a comma-separated multiplier list (e.g. `"1000000,1000"`).
    pub fn parse_multipliers(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }
}
