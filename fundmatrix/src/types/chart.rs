use serde::{Deserialize, Serialize};

/// One point of a funding-chart series as returned by the chart
/// procedures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// ISO-8601 funding timestamp.
    pub funding_time: String,
    /// Annualized rate (or spread) in percent; null points are skipped when
    /// the series is built.
    #[serde(default)]
    pub apr: Option<f64>,
}

impl ChartPoint {
    pub fn new(funding_time: impl Into<String>, apr: f64) -> Self {
        Self {
            funding_time: funding_time.into(),
            apr: Some(apr),
        }
    }
}
