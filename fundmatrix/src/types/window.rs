use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FundmatrixError;

/// Aggregation window of an annualized funding rate.
///
/// Labels match the column names of the funding matrix view.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "now")]
    Now,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "3d")]
    Day3,
    #[serde(rename = "7d")]
    Day7,
    #[serde(rename = "15d")]
    Day15,
    #[serde(rename = "30d")]
    Day30,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::Now,
        TimeWindow::Day1,
        TimeWindow::Day3,
        TimeWindow::Day7,
        TimeWindow::Day15,
        TimeWindow::Day30,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Now => "now",
            TimeWindow::Day1 => "1d",
            TimeWindow::Day3 => "3d",
            TimeWindow::Day7 => "7d",
            TimeWindow::Day15 => "15d",
            TimeWindow::Day30 => "30d",
        }
    }

    /// Window length in days (`now` is 0), as used by the arbitrage view.
    pub fn days(self) -> u32 {
        match self {
            TimeWindow::Now => 0,
            TimeWindow::Day1 => 1,
            TimeWindow::Day3 => 3,
            TimeWindow::Day7 => 7,
            TimeWindow::Day15 => 15,
            TimeWindow::Day30 => 30,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = FundmatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        TimeWindow::ALL
            .into_iter()
            .find(|w| w.label() == needle)
            .ok_or_else(|| FundmatrixError::UnknownWindow(s.to_string()))
    }
}
