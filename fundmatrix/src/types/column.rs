use serde::{Deserialize, Serialize};

/// One market column of the funding matrix (a row of `exchange_columns`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeColumn {
    pub column_key: String,
    pub exchange: String,
    #[serde(default)]
    pub quote: Option<String>,
}

impl ExchangeColumn {
    pub fn new(column_key: impl Into<String>, exchange: impl Into<String>, quote: Option<&str>) -> Self {
        Self {
            column_key: column_key.into(),
            exchange: exchange.into(),
            quote: quote.map(str::to_string),
        }
    }
}
