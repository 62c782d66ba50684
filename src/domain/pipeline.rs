//! Indicator pipeline: load history, compute the indicator bundle, upsert.
//!
//! Every write is an upsert keyed by (instrument, date), so overlapping
//! runs converge on the same stored rows.

use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::error::ForecastError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::ohlcv::{normalize_history, Instrument};
use crate::ports::indicator_port::IndicatorStore;
use crate::ports::price_port::PriceStore;

/// Instrument metadata loaded once per run. Call [`refresh`] to pick up
/// instruments added after construction.
///
/// [`refresh`]: InstrumentCache::refresh
#[derive(Debug, Clone, Default)]
pub struct InstrumentCache {
    instruments: BTreeMap<String, Instrument>,
}

impl InstrumentCache {
    pub fn load(prices: &dyn PriceStore) -> Result<Self, ForecastError> {
        let mut cache = InstrumentCache::default();
        cache.refresh(prices)?;
        Ok(cache)
    }

    pub fn refresh(&mut self, prices: &dyn PriceStore) -> Result<(), ForecastError> {
        self.instruments = prices
            .list_instruments()?
            .into_iter()
            .map(|i| (i.ticker.clone(), i))
            .collect();
        Ok(())
    }

    pub fn get(&self, ticker: &str) -> Option<&Instrument> {
        self.instruments.get(ticker)
    }

    pub fn tickers(&self) -> Vec<String> {
        self.instruments.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub instrument: String,
    pub success: bool,
    pub saved_count: usize,
    pub insufficient_history: bool,
    pub error: Option<String>,
}

impl PipelineResult {
    fn failed(instrument: &str, err: &ForecastError) -> Self {
        PipelineResult {
            instrument: instrument.to_string(),
            success: false,
            saved_count: 0,
            insufficient_history: false,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<PipelineResult>,
}

pub struct IndicatorPipeline<'a> {
    prices: &'a dyn PriceStore,
    indicators: &'a dyn IndicatorStore,
    cache: InstrumentCache,
}

impl<'a> IndicatorPipeline<'a> {
    pub fn new(
        prices: &'a dyn PriceStore,
        indicators: &'a dyn IndicatorStore,
    ) -> Result<Self, ForecastError> {
        let cache = InstrumentCache::load(prices)?;
        Ok(Self {
            prices,
            indicators,
            cache,
        })
    }

    pub fn refresh(&mut self) -> Result<(), ForecastError> {
        self.cache.refresh(self.prices)
    }

    pub fn instruments(&self) -> &InstrumentCache {
        &self.cache
    }

    /// Computes and stores indicators for one instrument. Never returns an
    /// error: failures are reported in the result.
    pub fn compute_indicators(&self, ticker: &str) -> PipelineResult {
        if self.cache.get(ticker).is_none() {
            let err = ForecastError::NotFound {
                ticker: ticker.to_string(),
            };
            warn!("{err}");
            return PipelineResult::failed(ticker, &err);
        }

        match self.run(ticker) {
            Ok((saved_count, insufficient_history)) => {
                info!("{ticker}: saved {saved_count} indicator snapshots");
                PipelineResult {
                    instrument: ticker.to_string(),
                    success: true,
                    saved_count,
                    insufficient_history,
                    error: None,
                }
            }
            Err(err) if err.is_data_availability() => {
                warn!("{ticker}: indicator computation skipped: {err}");
                PipelineResult::failed(ticker, &err)
            }
            Err(err) => {
                error!("{ticker}: indicator computation failed: {err}");
                PipelineResult::failed(ticker, &err)
            }
        }
    }

    fn run(&self, ticker: &str) -> Result<(usize, bool), ForecastError> {
        let history = normalize_history(self.prices.get_prices(ticker)?);

        let minimum = IndicatorSnapshot::max_lookback();
        let insufficient = history.len() < minimum;
        if insufficient {
            let err = ForecastError::InsufficientHistory {
                ticker: ticker.to_string(),
                points: history.len(),
                minimum,
            };
            warn!("{err}; storing the computable subset");
        }

        let mut saved = 0;
        for snapshot in IndicatorSnapshot::compute_all(&history) {
            if snapshot.has_any_value() {
                self.indicators.upsert_indicator(ticker, &snapshot)?;
                saved += 1;
            }
        }
        Ok((saved, insufficient))
    }

    /// Runs [`compute_indicators`] over every cached instrument. One
    /// instrument failing never stops the others.
    ///
    /// [`compute_indicators`]: IndicatorPipeline::compute_indicators
    pub fn compute_all_indicators(&self) -> BatchResult {
        let mut batch = BatchResult::default();
        for ticker in self.cache.tickers() {
            let result = self.compute_indicators(&ticker);
            if result.success {
                batch.succeeded += 1;
            } else {
                batch.failed += 1;
            }
            batch.results.push(result);
        }
        info!(
            "indicator batch finished: {} succeeded, {} failed",
            batch.succeeded, batch.failed
        );
        batch
    }
}
