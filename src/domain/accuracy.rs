//! Accuracy rollups over resolved predictions.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::prediction::{Enrichment, Prediction};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyRollup {
    pub total: usize,
    pub correct: usize,
    pub accuracy_percent: f64,
    pub confidence_weighted_accuracy_percent: f64,
    /// Mean over predictions that carry a predicted price only.
    pub avg_price_error_percent: Option<f64>,
    /// Mean over predictions that carry a trading return only.
    pub avg_trading_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub overall: AccuracyRollup,
    pub by_instrument: BTreeMap<String, AccuracyRollup>,
    pub by_model: BTreeMap<String, AccuracyRollup>,
}

fn mean_of_present<F>(enrichments: &[&Enrichment], f: F) -> Option<f64>
where
    F: Fn(&Enrichment) -> Option<f64>,
{
    let values: Vec<f64> = enrichments.iter().filter_map(|e| f(*e)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl AccuracyRollup {
    pub fn compute<'a, I>(predictions: I) -> Self
    where
        I: IntoIterator<Item = &'a Prediction>,
    {
        let enrichments: Vec<&Enrichment> = predictions
            .into_iter()
            .filter_map(|p| p.enrichment.as_ref())
            .collect();

        let total = enrichments.len();
        let correct = enrichments.iter().filter(|e| e.is_correct).count();

        let (accuracy_percent, confidence_weighted_accuracy_percent) = if total > 0 {
            let weighted: f64 = enrichments.iter().map(|e| e.confidence_weighted_score).sum();
            (
                correct as f64 / total as f64 * 100.0,
                weighted / total as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        AccuracyRollup {
            total,
            correct,
            accuracy_percent,
            confidence_weighted_accuracy_percent,
            avg_price_error_percent: mean_of_present(&enrichments, |e| e.price_error_percent),
            avg_trading_return: mean_of_present(&enrichments, |e| e.trading_return),
        }
    }
}

/// Overall, per-instrument and per-model rollups. Pending predictions in
/// the input are ignored.
pub fn accuracy_report(predictions: &[Prediction]) -> AccuracyReport {
    let resolved: Vec<&Prediction> = predictions.iter().filter(|p| p.is_resolved()).collect();

    let mut instruments: BTreeMap<String, Vec<&Prediction>> = BTreeMap::new();
    let mut models: BTreeMap<String, Vec<&Prediction>> = BTreeMap::new();
    for p in resolved.iter().copied() {
        instruments.entry(p.instrument.clone()).or_default().push(p);
        models.entry(p.model.clone()).or_default().push(p);
    }

    AccuracyReport {
        overall: AccuracyRollup::compute(resolved.iter().copied()),
        by_instrument: instruments
            .into_iter()
            .map(|(k, v)| (k, AccuracyRollup::compute(v)))
            .collect(),
        by_model: models
            .into_iter()
            .map(|(k, v)| (k, AccuracyRollup::compute(v)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{Direction, Outcome};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn resolved(
        instrument: &str,
        model: &str,
        confidence: f64,
        correct: bool,
        price_error: Option<f64>,
        trading_return: Option<f64>,
    ) -> Prediction {
        Prediction {
            id: 0,
            instrument: instrument.into(),
            model: model.into(),
            prediction_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            target_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            predicted_direction: Direction::Up,
            predicted_price: price_error.map(|_| 100.0),
            predicted_change_percent: None,
            confidence,
            enrichment: Some(Enrichment {
                actual_direction: if correct { Outcome::Up } else { Outcome::Down },
                actual_price: 100.0,
                baseline_price: 100.0,
                actual_change_percent: 0.0,
                is_correct: correct,
                confidence_weighted_score: if correct { confidence } else { 0.0 },
                price_error_percent: price_error,
                trading_return,
            }),
        }
    }

    #[test]
    fn overall_accuracy() {
        let preds = vec![
            resolved("EQNR", "a", 0.8, true, Some(2.0), Some(3.0)),
            resolved("EQNR", "a", 0.6, false, Some(4.0), Some(-1.0)),
            resolved("DNB", "b", 0.7, true, None, None),
            resolved("DNB", "b", 0.9, true, None, Some(5.0)),
        ];
        let report = accuracy_report(&preds);

        assert_eq!(report.overall.total, 4);
        assert_eq!(report.overall.correct, 3);
        assert_relative_eq!(report.overall.accuracy_percent, 75.0);
        // (0.8 + 0 + 0.7 + 0.9) / 4 * 100
        assert_relative_eq!(
            report.overall.confidence_weighted_accuracy_percent,
            60.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn optional_metrics_exclude_missing_values() {
        let preds = vec![
            resolved("EQNR", "a", 0.8, true, Some(2.0), Some(3.0)),
            resolved("EQNR", "a", 0.6, false, Some(4.0), None),
            resolved("EQNR", "a", 0.4, true, None, None),
        ];
        let rollup = AccuracyRollup::compute(&preds);
        assert_relative_eq!(rollup.avg_price_error_percent.unwrap(), 3.0);
        assert_relative_eq!(rollup.avg_trading_return.unwrap(), 3.0);
    }

    #[test]
    fn grouped_by_instrument_and_model() {
        let preds = vec![
            resolved("EQNR", "a", 0.8, true, None, None),
            resolved("DNB", "a", 0.8, false, None, None),
            resolved("DNB", "b", 0.8, true, None, None),
        ];
        let report = accuracy_report(&preds);

        assert_eq!(report.by_instrument["DNB"].total, 2);
        assert_eq!(report.by_instrument["EQNR"].correct, 1);
        assert_eq!(report.by_model["a"].total, 2);
        assert_relative_eq!(report.by_model["b"].accuracy_percent, 100.0);
    }

    #[test]
    fn pending_predictions_are_ignored() {
        let mut pending = resolved("EQNR", "a", 0.8, true, None, None);
        pending.enrichment = None;
        let report = accuracy_report(&[pending]);
        assert_eq!(report.overall.total, 0);
        assert_eq!(report.overall.accuracy_percent, 0.0);
        assert!(report.overall.avg_trading_return.is_none());
        assert!(report.by_instrument.is_empty());
    }
}
