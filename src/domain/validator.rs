//! Prediction validation: resolves pending predictions against realized
//! prices.
//!
//! A prediction moves `pending -> resolved` exactly once. The store's
//! guarded write makes a second resolution attempt a no-op, so two
//! overlapping runs cannot double-count.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;

use crate::domain::calendar::MarketCalendar;
use crate::domain::error::ForecastError;
use crate::domain::ohlcv::PricePoint;
use crate::domain::prediction::{Direction, Enrichment, Outcome, Prediction};
use crate::ports::prediction_port::PredictionStore;
use crate::ports::price_port::PriceStore;

/// Parameters for the single-trade return attached to each prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Trading return is only computed above this confidence.
    pub min_trade_confidence: f64,
    /// Flat fee in percentage points subtracted from the scaled return.
    pub trade_fee_percent: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            min_trade_confidence: 0.5,
            trade_fee_percent: 0.2,
        }
    }
}

#[derive(Debug)]
pub struct ValidationIssue {
    pub prediction_id: i64,
    pub error: ForecastError,
}

#[derive(Debug, Default)]
pub struct ValidationSummary {
    pub validated: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub already_resolved: usize,
    pub skipped: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCounts {
    pub validated: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub already_resolved: usize,
    pub skipped: usize,
}

impl ValidationSummary {
    pub fn counts(&self) -> ValidationCounts {
        ValidationCounts {
            validated: self.validated,
            correct: self.correct,
            incorrect: self.incorrect,
            already_resolved: self.already_resolved,
            skipped: self.skipped.len(),
        }
    }
}

/// Scores one prediction against its baseline and realized price points.
pub fn score_prediction(
    prediction: &Prediction,
    baseline: &PricePoint,
    actual: &PricePoint,
    config: &ScoringConfig,
) -> Enrichment {
    let baseline_price = baseline.close;
    let actual_price = actual.close;

    let actual_change_percent = (actual_price - baseline_price) / baseline_price * 100.0;
    let actual_direction = Outcome::from_change(actual_change_percent);
    let is_correct = actual_direction.matches(prediction.predicted_direction);

    let confidence_weighted_score = if is_correct { prediction.confidence } else { 0.0 };

    let price_error_percent = prediction
        .predicted_price
        .map(|predicted| (predicted - actual_price).abs() / actual_price * 100.0);

    let trading_return = if prediction.confidence > config.min_trade_confidence {
        let gross = match prediction.predicted_direction {
            Direction::Up => (actual_price - baseline_price) / baseline_price * 100.0,
            Direction::Down => (baseline_price - actual_price) / baseline_price * 100.0,
        };
        Some(gross * prediction.confidence - config.trade_fee_percent)
    } else {
        None
    };

    Enrichment {
        actual_direction,
        actual_price,
        baseline_price,
        actual_change_percent,
        is_correct,
        confidence_weighted_score,
        price_error_percent,
        trading_return,
    }
}

pub struct PredictionValidator<'a> {
    prices: &'a dyn PriceStore,
    predictions: &'a dyn PredictionStore,
    config: ScoringConfig,
    calendar: Option<MarketCalendar>,
}

impl<'a> PredictionValidator<'a> {
    pub fn new(prices: &'a dyn PriceStore, predictions: &'a dyn PredictionStore) -> Self {
        Self {
            prices,
            predictions,
            config: ScoringConfig::default(),
            calendar: None,
        }
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_calendar(mut self, calendar: MarketCalendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Resolves every pending prediction whose target date is strictly
    /// before `today`. Predictions lacking price data stay pending and are
    /// reported in `skipped`; the next run picks them up again. Store
    /// failures abort the run.
    pub fn validate_predictions(
        &self,
        today: NaiveDate,
    ) -> Result<ValidationSummary, ForecastError> {
        let pending = self.predictions.pending_predictions(today)?;
        info!("validating {} pending predictions", pending.len());

        let mut summary = ValidationSummary::default();
        for prediction in pending {
            if prediction.is_resolved() || prediction.target_date >= today {
                continue;
            }

            let enrichment = match self.resolve(&prediction) {
                Ok(e) => e,
                Err(error) if error.is_data_availability() => {
                    warn!("prediction {} left pending: {error}", prediction.id);
                    summary.skipped.push(ValidationIssue {
                        prediction_id: prediction.id,
                        error,
                    });
                    continue;
                }
                Err(error) => return Err(error),
            };

            if !self.predictions.save_enrichment(prediction.id, &enrichment)? {
                debug!("prediction {} was resolved concurrently", prediction.id);
                summary.already_resolved += 1;
                continue;
            }

            summary.validated += 1;
            if enrichment.is_correct {
                summary.correct += 1;
            } else {
                summary.incorrect += 1;
            }
        }

        info!(
            "validated {} predictions ({} correct, {} incorrect, {} skipped)",
            summary.validated,
            summary.correct,
            summary.incorrect,
            summary.skipped.len()
        );
        Ok(summary)
    }

    fn resolve(&self, prediction: &Prediction) -> Result<Enrichment, ForecastError> {
        let ticker = &prediction.instrument;

        let actual = match self.prices.get_price(ticker, prediction.target_date)? {
            Some(p) => p,
            None => {
                if let Some(cal) = &self.calendar {
                    if !cal.is_trading_day(prediction.target_date) {
                        debug!(
                            "{ticker}: target date {} is not a trading day",
                            prediction.target_date
                        );
                    }
                }
                return Err(ForecastError::MissingPriceData {
                    ticker: ticker.clone(),
                    date: prediction.target_date,
                    reason: "no price on target date".into(),
                });
            }
        };

        let baseline = self
            .prices
            .get_price_on_or_before(ticker, prediction.prediction_date)?
            .ok_or_else(|| ForecastError::MissingPriceData {
                ticker: ticker.clone(),
                date: prediction.prediction_date,
                reason: "no baseline price at or before prediction date".into(),
            })?;

        let usable = |close: f64| close.is_finite() && close > 0.0;
        if !usable(baseline.close) || !usable(actual.close) {
            return Err(ForecastError::MissingPriceData {
                ticker: ticker.clone(),
                date: baseline.date,
                reason: "non-positive or non-finite close price".into(),
            });
        }

        Ok(score_prediction(prediction, &baseline, &actual, &self.config))
    }
}
