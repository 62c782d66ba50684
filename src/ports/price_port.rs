//! Price history access port trait.

use crate::domain::error::ForecastError;
use crate::domain::ohlcv::{Instrument, PricePoint};
use chrono::NaiveDate;

pub trait PriceStore {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ForecastError>;

    /// Full history for `ticker`, ascending by date.
    fn get_prices(&self, ticker: &str) -> Result<Vec<PricePoint>, ForecastError>;

    fn get_price(&self, ticker: &str, date: NaiveDate)
    -> Result<Option<PricePoint>, ForecastError>;

    /// Most recent point dated at or before `date`.
    fn get_price_on_or_before(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<PricePoint>, ForecastError>;
}
