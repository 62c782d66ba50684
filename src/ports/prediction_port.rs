//! Prediction storage port trait.

use crate::domain::error::ForecastError;
use crate::domain::prediction::{Enrichment, Prediction};
use chrono::NaiveDate;

/// Narrows resolved-prediction queries; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionFilter {
    pub instrument: Option<String>,
    pub model: Option<String>,
}

impl PredictionFilter {
    pub fn matches(&self, prediction: &Prediction) -> bool {
        self.instrument
            .as_ref()
            .is_none_or(|i| *i == prediction.instrument)
            && self.model.as_ref().is_none_or(|m| *m == prediction.model)
    }
}

pub trait PredictionStore {
    /// Unresolved predictions whose target date is strictly before `before`.
    fn pending_predictions(&self, before: NaiveDate) -> Result<Vec<Prediction>, ForecastError>;

    fn resolved_predictions(
        &self,
        filter: &PredictionFilter,
    ) -> Result<Vec<Prediction>, ForecastError>;

    /// Unresolved predictions whose target date is on or after `from`.
    fn unresolved_predictions(&self, from: NaiveDate) -> Result<Vec<Prediction>, ForecastError>;

    /// Writes the enrichment only if the prediction is still pending.
    /// Returns `false` when it had already been resolved.
    fn save_enrichment(&self, id: i64, enrichment: &Enrichment) -> Result<bool, ForecastError>;
}
