#![allow(dead_code, unused_imports)]

use chrono::NaiveDate;
use forecastlab::domain::error::ForecastError;
use forecastlab::domain::indicator::IndicatorSnapshot;
pub use forecastlab::domain::ohlcv::{Instrument, PricePoint};
pub use forecastlab::domain::prediction::{Direction, Enrichment, Outcome, Prediction};
use forecastlab::ports::indicator_port::IndicatorStore;
use forecastlab::ports::prediction_port::{PredictionFilter, PredictionStore};
use forecastlab::ports::price_port::PriceStore;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// In-memory implementation of every store port.
pub struct MockStore {
    pub instruments: RefCell<Vec<Instrument>>,
    pub prices: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub predictions: RefCell<Vec<Prediction>>,
    pub indicators: RefCell<BTreeMap<(String, NaiveDate), IndicatorSnapshot>>,
    pub upsert_calls: RefCell<usize>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            instruments: RefCell::new(Vec::new()),
            prices: HashMap::new(),
            errors: HashMap::new(),
            predictions: RefCell::new(Vec::new()),
            indicators: RefCell::new(BTreeMap::new()),
            upsert_calls: RefCell::new(0),
        }
    }

    pub fn with_prices(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.add_instrument(ticker);
        self.prices.insert(ticker.to_string(), points);
        self
    }

    /// Registers `ticker` but makes every price query for it fail.
    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.add_instrument(ticker);
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    /// Lists `ticker` without giving it any prices.
    pub fn add_instrument(&self, ticker: &str) {
        self.instruments.borrow_mut().push(Instrument {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
        });
    }

    pub fn with_prediction(self, prediction: Prediction) -> Self {
        self.predictions.borrow_mut().push(prediction);
        self
    }

    pub fn prediction(&self, id: i64) -> Prediction {
        self.predictions
            .borrow()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap()
    }

    pub fn stored_indicators(&self, ticker: &str) -> Vec<IndicatorSnapshot> {
        self.indicators
            .borrow()
            .iter()
            .filter(|((t, _), _)| t == ticker)
            .map(|(_, s)| s.clone())
            .collect()
    }

    fn check(&self, ticker: &str) -> Result<(), ForecastError> {
        match self.errors.get(ticker) {
            Some(reason) => Err(ForecastError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn sorted(&self, ticker: &str) -> Vec<PricePoint> {
        let mut points = self.prices.get(ticker).cloned().unwrap_or_default();
        points.sort_by_key(|p| p.date);
        points
    }
}

impl PriceStore for MockStore {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ForecastError> {
        Ok(self.instruments.borrow().clone())
    }

    fn get_prices(&self, ticker: &str) -> Result<Vec<PricePoint>, ForecastError> {
        self.check(ticker)?;
        Ok(self.sorted(ticker))
    }

    fn get_price(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<PricePoint>, ForecastError> {
        self.check(ticker)?;
        Ok(self.sorted(ticker).into_iter().find(|p| p.date == date))
    }

    fn get_price_on_or_before(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<PricePoint>, ForecastError> {
        self.check(ticker)?;
        Ok(self
            .sorted(ticker)
            .into_iter()
            .filter(|p| p.date <= date)
            .last())
    }
}

impl PredictionStore for MockStore {
    fn pending_predictions(&self, before: NaiveDate) -> Result<Vec<Prediction>, ForecastError> {
        Ok(self
            .predictions
            .borrow()
            .iter()
            .filter(|p| !p.is_resolved() && p.target_date < before)
            .cloned()
            .collect())
    }

    fn resolved_predictions(
        &self,
        filter: &PredictionFilter,
    ) -> Result<Vec<Prediction>, ForecastError> {
        Ok(self
            .predictions
            .borrow()
            .iter()
            .filter(|p| p.is_resolved() && filter.matches(p))
            .cloned()
            .collect())
    }

    fn unresolved_predictions(&self, from: NaiveDate) -> Result<Vec<Prediction>, ForecastError> {
        Ok(self
            .predictions
            .borrow()
            .iter()
            .filter(|p| !p.is_resolved() && p.target_date >= from)
            .cloned()
            .collect())
    }

    fn save_enrichment(&self, id: i64, enrichment: &Enrichment) -> Result<bool, ForecastError> {
        let mut predictions = self.predictions.borrow_mut();
        match predictions.iter_mut().find(|p| p.id == id) {
            Some(p) if p.enrichment.is_none() => {
                p.enrichment = Some(enrichment.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl IndicatorStore for MockStore {
    fn upsert_indicator(
        &self,
        ticker: &str,
        snapshot: &IndicatorSnapshot,
    ) -> Result<(), ForecastError> {
        *self.upsert_calls.borrow_mut() += 1;
        self.indicators
            .borrow_mut()
            .insert((ticker.to_string(), snapshot.date), snapshot.clone());
        Ok(())
    }

    fn get_indicators(&self, ticker: &str) -> Result<Vec<IndicatorSnapshot>, ForecastError> {
        Ok(self.stored_indicators(ticker))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(date: NaiveDate, close: f64) -> PricePoint {
    PricePoint {
        date,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// `count` consecutive calendar days of a gently oscillating uptrend.
pub fn generate_points(start: NaiveDate, count: usize, start_price: f64) -> Vec<PricePoint> {
    (0..count)
        .map(|i| {
            let wiggle = if i % 3 == 0 { -0.7 } else { 0.4 };
            make_point(
                start + chrono::Duration::days(i as i64),
                start_price + i as f64 * 0.5 + wiggle,
            )
        })
        .collect()
}

pub fn pending_prediction(
    id: i64,
    instrument: &str,
    prediction_date: NaiveDate,
    target_date: NaiveDate,
    direction: Direction,
    confidence: f64,
) -> Prediction {
    Prediction {
        id,
        instrument: instrument.to_string(),
        model: "lstm_v1".to_string(),
        prediction_date,
        target_date,
        predicted_direction: direction,
        predicted_price: None,
        predicted_change_percent: None,
        confidence,
        enrichment: None,
    }
}
