//! Directional predictions and their realized-outcome enrichment.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ForecastError;

/// Direction a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Realized price movement between baseline and target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Up,
    Down,
    Flat,
}

impl Outcome {
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent > 0.0 {
            Outcome::Up
        } else if change_percent < 0.0 {
            Outcome::Down
        } else {
            Outcome::Flat
        }
    }

    /// Flat never matches a directional call.
    pub fn matches(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Outcome::Up, Direction::Up) | (Outcome::Down, Direction::Down)
        )
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Up => write!(f, "up"),
            Outcome::Down => write!(f, "down"),
            Outcome::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for Direction {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(ForecastError::InvalidPrediction {
                reason: format!("unknown direction '{}'", other),
            }),
        }
    }
}

impl FromStr for Outcome {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Outcome::Up),
            "down" => Ok(Outcome::Down),
            "flat" => Ok(Outcome::Flat),
            other => Err(ForecastError::InvalidPrediction {
                reason: format!("unknown outcome '{}'", other),
            }),
        }
    }
}

/// Fields written once by the validator when a prediction resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrichment {
    pub actual_direction: Outcome,
    pub actual_price: f64,
    pub baseline_price: f64,
    pub actual_change_percent: f64,
    pub is_correct: bool,
    pub confidence_weighted_score: f64,
    pub price_error_percent: Option<f64>,
    pub trading_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub id: i64,
    pub instrument: String,
    pub model: String,
    pub prediction_date: NaiveDate,
    pub target_date: NaiveDate,
    pub predicted_direction: Direction,
    pub predicted_price: Option<f64>,
    pub predicted_change_percent: Option<f64>,
    pub confidence: f64,
    pub enrichment: Option<Enrichment>,
}

/// A prediction as produced upstream, before it has a storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub instrument: String,
    pub model: String,
    pub prediction_date: NaiveDate,
    pub target_date: NaiveDate,
    pub predicted_direction: Direction,
    pub predicted_price: Option<f64>,
    pub predicted_change_percent: Option<f64>,
    pub confidence: f64,
}

impl NewPrediction {
    /// Rejects malformed predictions at ingestion time.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.instrument.trim().is_empty() {
            return Err(ForecastError::InvalidPrediction {
                reason: "instrument must not be empty".into(),
            });
        }
        if self.target_date <= self.prediction_date {
            return Err(ForecastError::InvalidPrediction {
                reason: format!(
                    "target date {} must be after prediction date {}",
                    self.target_date, self.prediction_date
                ),
            });
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ForecastError::InvalidPrediction {
                reason: format!("confidence {} outside [0, 1]", self.confidence),
            });
        }
        if let Some(price) = self.predicted_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(ForecastError::InvalidPrediction {
                    reason: format!("predicted price {} must be positive", price),
                });
            }
        }
        Ok(())
    }

    pub fn with_id(self, id: i64) -> Prediction {
        Prediction {
            id,
            instrument: self.instrument,
            model: self.model,
            prediction_date: self.prediction_date,
            target_date: self.target_date,
            predicted_direction: self.predicted_direction,
            predicted_price: self.predicted_price,
            predicted_change_percent: self.predicted_change_percent,
            confidence: self.confidence,
            enrichment: None,
        }
    }
}

impl Prediction {
    pub fn is_resolved(&self) -> bool {
        self.enrichment.is_some()
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.enrichment.as_ref().map(|e| e.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewPrediction {
        NewPrediction {
            instrument: "EQNR".into(),
            model: "lstm_v1".into(),
            prediction_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            target_date: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            predicted_direction: Direction::Up,
            predicted_price: Some(310.0),
            predicted_change_percent: Some(1.2),
            confidence: 0.66,
        }
    }

    #[test]
    fn valid_prediction_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn target_must_follow_prediction_date() {
        let mut p = sample();
        p.target_date = p.prediction_date;
        assert!(matches!(
            p.validate(),
            Err(ForecastError::InvalidPrediction { .. })
        ));
    }

    #[test]
    fn confidence_bounds() {
        let mut p = sample();
        p.confidence = 1.2;
        assert!(p.validate().is_err());
        p.confidence = f64::NAN;
        assert!(p.validate().is_err());
        p.confidence = 0.0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn flat_never_matches() {
        assert!(!Outcome::Flat.matches(Direction::Up));
        assert!(!Outcome::Flat.matches(Direction::Down));
        assert!(Outcome::Up.matches(Direction::Up));
        assert!(!Outcome::Down.matches(Direction::Up));
    }

    #[test]
    fn outcome_from_change_sign() {
        assert_eq!(Outcome::from_change(0.4), Outcome::Up);
        assert_eq!(Outcome::from_change(-0.1), Outcome::Down);
        assert_eq!(Outcome::from_change(0.0), Outcome::Flat);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!(" UP ".parse::<Direction>().unwrap(), Direction::Up);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!("flat".parse::<Outcome>().unwrap(), Outcome::Flat);
    }

    #[test]
    fn new_prediction_starts_pending() {
        let p = sample().with_id(9);
        assert_eq!(p.id, 9);
        assert!(!p.is_resolved());
        assert_eq!(p.is_correct(), None);
    }
}
