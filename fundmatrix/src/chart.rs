//! Funding and spread chart series.
//!
//! The chart procedures return `(funding_time, apr)` points. Building a
//! series drops points without a finite value or a parseable timestamp and
//! computes the x bounds the chart pans and zooms within.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::ChartPoint;

/// Default look-back of a chart request.
pub const DEFAULT_CHART_DAYS: u32 = 30;

/// Narrowest zoom the chart allows.
pub const MIN_ZOOM_RANGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

const EMPTY_RANGE_MS: i64 = DEFAULT_CHART_DAYS as i64 * 24 * 60 * 60 * 1000;

/// Parameters of `get_funding_chart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingChartParams {
    pub p_market_id: i64,
    pub p_days: u32,
}

/// Parameters of `get_arb_chart_data`: the spread of one long/short pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbChartParams {
    pub p_base_asset: String,
    pub p_long_exchange: String,
    pub p_short_exchange: String,
    pub p_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Unix time in milliseconds.
    pub x: i64,
    pub y: f64,
}

/// A plottable series and its x bounds in Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub points: Vec<SeriesPoint>,
    pub min_x: i64,
    pub max_x: i64,
}

impl ChartSeries {
    /// Widest zoom; never below one millisecond.
    pub fn span_ms(&self) -> i64 {
        (self.max_x - self.min_x).max(1)
    }
}

/// Build a series from raw points.
///
/// Without any usable point the bounds cover the `DEFAULT_CHART_DAYS` days
/// up to `now`.
pub fn build_series(points: &[ChartPoint], now: DateTime<Utc>) -> ChartSeries {
    let points: Vec<SeriesPoint> = points
        .iter()
        .filter_map(|p| {
            let y = p.apr.filter(|y| y.is_finite())?;
            let x = DateTime::parse_from_rfc3339(p.funding_time.trim()).ok()?;
            Some(SeriesPoint {
                x: x.timestamp_millis(),
                y,
            })
        })
        .collect();

    let now_ms = now.timestamp_millis();
    let (min_x, max_x) = match (points.iter().map(|p| p.x).min(), points.iter().map(|p| p.x).max()) {
        (Some(min), Some(max)) => (min, max),
        _ => (now_ms - EMPTY_RANGE_MS, now_ms),
    };
    ChartSeries {
        points,
        min_x,
        max_x,
    }
}
