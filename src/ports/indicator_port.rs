//! Indicator snapshot storage port trait.

use crate::domain::error::ForecastError;
use crate::domain::indicator::IndicatorSnapshot;

pub trait IndicatorStore {
    /// Inserts or replaces the snapshot keyed by (ticker, snapshot.date).
    fn upsert_indicator(
        &self,
        ticker: &str,
        snapshot: &IndicatorSnapshot,
    ) -> Result<(), ForecastError>;

    /// Stored snapshots for `ticker`, ascending by date.
    fn get_indicators(&self, ticker: &str) -> Result<Vec<IndicatorSnapshot>, ForecastError>;
}
