//! Trading simulation over resolved predictions, and read-only trade
//! recommendations for pending ones.
//!
//! The simulator is a pure replay: every qualifying prediction executes as
//! an immediate round trip between its baseline and actual close. Holding
//! periods are only used to enforce the per-instrument position limit.

use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::ForecastError;
use crate::domain::metrics::SimulationSummary;
use crate::domain::portfolio::SimulationLedger;
use crate::domain::position::{SimulatedPosition, TradeRecord, TradeSide};
use crate::domain::prediction::{Direction, Prediction};
use crate::domain::strategy::{SimulationConfig, TradingStrategy};

/// Confidence at or above which a recommendation is "strong".
pub const STRONG_CONFIDENCE: f64 = 0.70;
/// Confidence at or above which a recommendation is "moderate".
pub const MODERATE_CONFIDENCE: f64 = 0.60;

#[derive(Debug)]
pub struct SkippedTrade {
    pub prediction_id: i64,
    pub error: ForecastError,
}

#[derive(Debug)]
pub struct TradingSimulationResult {
    pub summary: SimulationSummary,
    pub by_instrument: BTreeMap<String, SimulationSummary>,
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedTrade>,
}

/// Replays resolved predictions in target-date order through a capital
/// ledger. Pending predictions and those below the confidence bar are
/// ignored outright; the rest either trade or land in `skipped`.
pub fn simulate(
    predictions: &[Prediction],
    strategy: &TradingStrategy,
    config: &SimulationConfig,
) -> TradingSimulationResult {
    let mut candidates: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.is_resolved() && p.confidence >= strategy.min_confidence)
        .collect();
    candidates.sort_by(|a, b| {
        a.target_date
            .cmp(&b.target_date)
            .then(a.prediction_date.cmp(&b.prediction_date))
            .then(a.id.cmp(&b.id))
    });

    let mut ledger = SimulationLedger::new(config.starting_capital);
    let mut skipped = Vec::new();

    for prediction in candidates {
        let Some(enrichment) = prediction.enrichment.as_ref() else {
            continue;
        };

        if ledger.open_positions(&prediction.instrument, prediction.prediction_date)
            >= strategy.max_positions_per_instrument
        {
            skip(
                &mut skipped,
                prediction,
                format!(
                    "position already open on {} as of {}",
                    prediction.instrument, prediction.prediction_date
                ),
            );
            continue;
        }

        if !ledger.can_afford(strategy.position_size) {
            skip(
                &mut skipped,
                prediction,
                format!(
                    "capital {:.2} below position size {:.2}",
                    ledger.capital, strategy.position_size
                ),
            );
            continue;
        }

        if enrichment.baseline_price <= 0.0 {
            skip(
                &mut skipped,
                prediction,
                format!("non-positive baseline price {}", enrichment.baseline_price),
            );
            continue;
        }

        let position = SimulatedPosition {
            instrument: prediction.instrument.clone(),
            entry_price: enrichment.baseline_price,
            exit_price: enrichment.actual_price,
            side: TradeSide::from(prediction.predicted_direction),
            size: strategy.position_size,
        };
        let fee = config.fee_for(position.size);
        let return_amount = position.net_pnl(fee);

        let trade = TradeRecord {
            prediction_id: prediction.id,
            instrument: prediction.instrument.clone(),
            prediction_date: prediction.prediction_date,
            target_date: prediction.target_date,
            side: position.side,
            confidence: prediction.confidence,
            entry_price: position.entry_price,
            exit_price: position.exit_price,
            size: position.size,
            shares: position.shares(),
            fee,
            return_amount,
            return_percent: return_amount / position.size * 100.0,
            was_correct: enrichment.is_correct,
            capital_after: ledger.capital + return_amount,
        };
        debug!(
            "{} {} {} on {}: {:+.2}",
            trade.side, trade.instrument, trade.prediction_id, trade.target_date, return_amount
        );
        ledger.record_trade(trade);
    }

    let trades = ledger.trades;
    let summary = SimulationSummary::compute(config.starting_capital, &trades);
    let by_instrument = SimulationSummary::compute_per_instrument(config.starting_capital, &trades);

    info!(
        "Simulated {} trades ({} skipped), final capital {:.2}",
        trades.len(),
        skipped.len(),
        summary.final_capital
    );

    TradingSimulationResult {
        summary,
        by_instrument,
        trades,
        skipped,
    }
}

fn skip(skipped: &mut Vec<SkippedTrade>, prediction: &Prediction, reason: String) {
    let error = ForecastError::ComputationSkipped {
        ticker: prediction.instrument.clone(),
        reason,
    };
    debug!("prediction {}: {}", prediction.id, error);
    skipped.push(SkippedTrade {
        prediction_id: prediction.id,
        error,
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Short,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Short => write!(f, "SHORT"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Conviction {
    Strong,
    Moderate,
    Weak,
}

impl Conviction {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= STRONG_CONFIDENCE {
            Conviction::Strong
        } else if confidence >= MODERATE_CONFIDENCE {
            Conviction::Moderate
        } else {
            Conviction::Weak
        }
    }
}

impl fmt::Display for Conviction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conviction::Strong => write!(f, "strong"),
            Conviction::Moderate => write!(f, "moderate"),
            Conviction::Weak => write!(f, "weak"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub prediction_id: i64,
    pub instrument: String,
    pub model: String,
    pub target_date: chrono::NaiveDate,
    pub action: Action,
    pub conviction: Conviction,
    pub confidence: f64,
    pub predicted_change_percent: Option<f64>,
    pub rationale: String,
}

/// Classifies pending predictions at or above `min_confidence` into
/// BUY/SHORT/HOLD. Highest confidence first; ties by target date.
pub fn recommend(unresolved: &[Prediction], min_confidence: f64) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = unresolved
        .iter()
        .filter(|p| !p.is_resolved() && p.confidence >= min_confidence)
        .map(recommendation_for)
        .collect();
    recommendations.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(a.target_date.cmp(&b.target_date))
            .then(a.prediction_id.cmp(&b.prediction_id))
    });
    recommendations
}

fn recommendation_for(prediction: &Prediction) -> Recommendation {
    let conviction = Conviction::from_confidence(prediction.confidence);
    let action = match (conviction, prediction.predicted_direction) {
        (Conviction::Weak, _) => Action::Hold,
        (_, Direction::Up) => Action::Buy,
        (_, Direction::Down) => Action::Short,
    };

    let change = prediction
        .predicted_change_percent
        .map(|c| format!(" ({:+.2}%)", c))
        .unwrap_or_default();
    let confidence_pct = prediction.confidence * 100.0;
    let rationale = match action {
        Action::Hold => format!(
            "{} predicts {}{} by {} at {:.0}% confidence; below the {:.0}% bar for a trade",
            prediction.model,
            prediction.predicted_direction,
            change,
            prediction.target_date,
            confidence_pct,
            MODERATE_CONFIDENCE * 100.0
        ),
        _ => format!(
            "{} {} signal: {} predicts {}{} by {} at {:.0}% confidence",
            conviction,
            action,
            prediction.model,
            prediction.predicted_direction,
            change,
            prediction.target_date,
            confidence_pct
        ),
    };

    Recommendation {
        prediction_id: prediction.id,
        instrument: prediction.instrument.clone(),
        model: prediction.model.clone(),
        target_date: prediction.target_date,
        action,
        conviction,
        confidence: prediction.confidence,
        predicted_change_percent: prediction.predicted_change_percent,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{Enrichment, Outcome};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn resolved(
        id: i64,
        instrument: &str,
        predicted: u32,
        target: u32,
        direction: Direction,
        confidence: f64,
        baseline: f64,
        actual: f64,
    ) -> Prediction {
        let change = (actual - baseline) / baseline * 100.0;
        let outcome = Outcome::from_change(change);
        Prediction {
            id,
            instrument: instrument.into(),
            model: "lstm".into(),
            prediction_date: date(predicted),
            target_date: date(target),
            predicted_direction: direction,
            predicted_price: None,
            predicted_change_percent: None,
            confidence,
            enrichment: Some(Enrichment {
                actual_direction: outcome,
                actual_price: actual,
                baseline_price: baseline,
                actual_change_percent: change,
                is_correct: outcome.matches(direction),
                confidence_weighted_score: 0.0,
                price_error_percent: None,
                trading_return: None,
            }),
        }
    }

    fn pending(id: i64, direction: Direction, confidence: f64) -> Prediction {
        Prediction {
            id,
            instrument: "EQNR".into(),
            model: "lstm".into(),
            prediction_date: date(10),
            target_date: date(11),
            predicted_direction: direction,
            predicted_price: Some(300.0),
            predicted_change_percent: Some(1.5),
            confidence,
            enrichment: None,
        }
    }

    #[test]
    fn three_sequential_trades() {
        let preds = vec![
            resolved(3, "EQNR", 10, 11, Direction::Up, 0.7, 100.0, 95.0),
            resolved(1, "EQNR", 1, 2, Direction::Up, 0.8, 100.0, 110.0),
            resolved(2, "EQNR", 5, 6, Direction::Down, 0.6, 110.0, 100.0),
        ];
        let result = simulate(&preds, &TradingStrategy::default(), &SimulationConfig::default());

        assert_eq!(result.trades.len(), 3);
        let ids: Vec<i64> = result.trades.iter().map(|t| t.prediction_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let sum: f64 = result.trades.iter().map(|t| t.return_amount).sum();
        assert_relative_eq!(result.summary.final_capital, 100_000.0 + sum, epsilon = 1e-6);
        assert_relative_eq!(
            result.trades[2].capital_after,
            result.summary.final_capital,
            epsilon = 1e-6
        );
    }

    #[test]
    fn trade_pnl_includes_fee() {
        let preds = vec![resolved(1, "EQNR", 1, 2, Direction::Up, 0.8, 100.0, 110.0)];
        let result = simulate(&preds, &TradingStrategy::default(), &SimulationConfig::default());
        let trade = &result.trades[0];
        // 100 shares * 10 - 20 fee
        assert_relative_eq!(trade.return_amount, 980.0, epsilon = 1e-9);
        assert_relative_eq!(trade.fee, 20.0, epsilon = 1e-9);
        assert!(trade.was_correct);
    }

    #[test]
    fn wrong_call_loses() {
        let preds = vec![resolved(1, "EQNR", 1, 2, Direction::Down, 0.8, 100.0, 110.0)];
        let result = simulate(&preds, &TradingStrategy::default(), &SimulationConfig::default());
        assert_relative_eq!(result.trades[0].return_amount, -1_020.0, epsilon = 1e-9);
        assert_eq!(result.summary.losing_trades, 1);
    }

    #[test]
    fn overlapping_position_is_skipped() {
        let strategy = TradingStrategy {
            min_confidence: 0.55,
            ..TradingStrategy::default()
        };
        let preds = vec![
            resolved(1, "EQNR", 1, 5, Direction::Up, 0.8, 100.0, 105.0),
            resolved(2, "EQNR", 3, 6, Direction::Up, 0.9, 100.0, 108.0),
        ];
        let result = simulate(&preds, &strategy, &SimulationConfig::default());

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].prediction_id, 1);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].prediction_id, 2);
        assert!(matches!(
            result.skipped[0].error,
            ForecastError::ComputationSkipped { .. }
        ));
    }

    #[test]
    fn other_instruments_are_independent() {
        let preds = vec![
            resolved(1, "EQNR", 1, 5, Direction::Up, 0.8, 100.0, 105.0),
            resolved(2, "DNB", 3, 6, Direction::Up, 0.8, 100.0, 108.0),
        ];
        let result = simulate(&preds, &TradingStrategy::default(), &SimulationConfig::default());
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.by_instrument.len(), 2);
    }

    #[test]
    fn low_confidence_and_pending_are_ignored() {
        let mut preds = vec![
            resolved(1, "EQNR", 1, 2, Direction::Up, 0.5, 100.0, 110.0),
            pending(2, Direction::Up, 0.9),
        ];
        preds[1].target_date = date(3);
        let result = simulate(&preds, &TradingStrategy::default(), &SimulationConfig::default());
        assert!(result.trades.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn insufficient_capital_skips() {
        let config = SimulationConfig {
            starting_capital: 5_000.0,
            ..SimulationConfig::default()
        };
        let preds = vec![resolved(1, "EQNR", 1, 2, Direction::Up, 0.8, 100.0, 110.0)];
        let result = simulate(&preds, &TradingStrategy::default(), &config);
        assert!(result.trades.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_relative_eq!(result.summary.final_capital, 5_000.0);
    }

    #[test]
    fn recommendation_tiers() {
        let preds = vec![
            pending(1, Direction::Up, 0.75),
            pending(2, Direction::Down, 0.65),
            pending(3, Direction::Up, 0.56),
            pending(4, Direction::Up, 0.40),
        ];
        let recs = recommend(&preds, 0.55);

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].action, Action::Buy);
        assert_eq!(recs[0].conviction, Conviction::Strong);
        assert_eq!(recs[1].action, Action::Short);
        assert_eq!(recs[1].conviction, Conviction::Moderate);
        assert_eq!(recs[2].action, Action::Hold);
        assert!(recs[0].rationale.contains("strong BUY"));
        assert!(recs[2].rationale.contains("below"));
    }

    #[test]
    fn recommend_ignores_resolved() {
        let preds = vec![resolved(1, "EQNR", 1, 2, Direction::Up, 0.9, 100.0, 110.0)];
        assert!(recommend(&preds, 0.5).is_empty());
    }
}
