use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ExchangeColumn, TokenRow};

/// Screener payload of the dashboard API: column list plus all matrix rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerSnapshot {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub columns: Vec<ExchangeColumn>,
    #[serde(default)]
    pub rows: Vec<TokenRow>,
}
