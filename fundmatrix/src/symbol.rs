//! Ticker normalization for search.
//!
//! Some venues list rebased contracts with a magnitude multiplier glued to the
//! ticker (`1000PEPE`, `BABYDOGE1000000`). Stripping the configured multipliers
//! lets `PEPE`, `pepe` and `1000PEPE` all match the same query.

/// Multipliers seen on rebased perpetual tickers, longest first.
pub const LEGACY_MULTIPLIERS: [&str; 6] = ["1000000", "100000", "10000", "1000", "100", "10"];

/// Canonicalizes token symbols for prefix matching.
#[derive(Debug, Clone, Default)]
pub struct SymbolNormalizer {
    multipliers: Vec<String>,
}

impl SymbolNormalizer {
    /// Create a normalizer stripping `multipliers`. Empty entries are ignored.
    pub fn new<I, S>(multipliers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let multipliers = multipliers
            .into_iter()
            .map(|m| m.as_ref().trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { multipliers }
    }

    pub fn multipliers(&self) -> &[String] {
        &self.multipliers
    }

    /// Upper-case, trim, and strip multiplier prefixes and suffixes.
    ///
    /// Passes repeat until nothing changes, so the output is a fixed point:
    /// `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(&self, symbol: &str) -> String {
        let mut x = symbol.to_uppercase();
        loop {
            let before = x.len();
            x = x.trim().to_string();
            for m in &self.multipliers {
                while let Some(rest) = x.strip_prefix(m.as_str()) {
                    x = rest.to_string();
                }
                while let Some(rest) = x.strip_suffix(m.as_str()) {
                    x = rest.to_string();
                }
            }
            if x.len() == before {
                return x;
            }
        }
    }

    /// Whether `symbol` matches a search `query` by normalized prefix.
    pub fn matches(&self, symbol: &str, query: &str) -> bool {
        self.normalize(symbol).starts_with(&self.normalize(query))
    }
}
