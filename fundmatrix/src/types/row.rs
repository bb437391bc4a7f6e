use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::Market;

/// Markets of one token keyed by market key (`exchange` or `exchange:quote`).
///
/// Ordered by key so that scans, and therefore tie-breaks, are deterministic.
pub type MarketMap = BTreeMap<String, Market>;

/// One token of the funding matrix with all of its listings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenRow {
    #[serde(default)]
    pub token: String,
    #[serde(default, deserialize_with = "deserialize_markets")]
    pub markets: MarketMap,
}

impl TokenRow {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            markets: MarketMap::new(),
        }
    }

    pub fn with_market(mut self, key: impl Into<String>, market: Market) -> Self {
        self.markets.insert(key.into(), market);
        self
    }
}

/// The view emits `null` for a missing markets object and for listings
/// without data; both are dropped.
fn deserialize_markets<'de, D>(deserializer: D) -> Result<MarketMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<Market>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, market)| market.map(|m| (key, m)))
        .collect())
}
