//! Daily OHLCV price records and tracked instruments.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
}

/// One trading day for one instrument. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PricePoint {
    /// All four prices are finite and the high/low range is not inverted.
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
            && self.high >= self.low
    }
}

/// Canonical ticker form used for every stored row and lookup.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Column views over an ascending price history.
pub struct PriceColumns {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
}

impl PriceColumns {
    pub fn from_points(points: &[PricePoint]) -> Self {
        PriceColumns {
            highs: points.iter().map(|p| p.high).collect(),
            lows: points.iter().map(|p| p.low).collect(),
            closes: points.iter().map(|p| p.close).collect(),
        }
    }
}

/// Sorts ascending by date and drops later duplicates of the same date.
pub fn normalize_history(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    points
}
