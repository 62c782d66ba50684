//! Per-date bundle of every indicator the pipeline stores.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::indicator::{
    adx, atr, bollinger, ema, macd, rsi, sma, stochastic, IndicatorType,
};
use crate::domain::ohlcv::{PriceColumns, PricePoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub rsi14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub atr14: Option<f64>,
    pub adx14: Option<f64>,
}

impl IndicatorSnapshot {
    /// The indicators a snapshot carries, in column order.
    pub fn indicator_types() -> Vec<IndicatorType> {
        vec![
            IndicatorType::Rsi(rsi::DEFAULT_PERIOD),
            IndicatorType::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
            IndicatorType::Sma(20),
            IndicatorType::Sma(50),
            IndicatorType::Sma(200),
            IndicatorType::Ema(12),
            IndicatorType::Ema(26),
            IndicatorType::Bollinger {
                period: bollinger::DEFAULT_PERIOD,
                stddev_mult_x100: (bollinger::DEFAULT_MULTIPLIER * 100.0) as u32,
            },
            IndicatorType::Stochastic {
                period: stochastic::DEFAULT_PERIOD,
                smooth_k: stochastic::DEFAULT_SMOOTH_K,
                smooth_d: stochastic::DEFAULT_SMOOTH_D,
            },
            IndicatorType::Atr(atr::DEFAULT_PERIOD),
            IndicatorType::Adx(adx::DEFAULT_PERIOD),
        ]
    }

    /// Longest lookback across the bundle (SMA 200).
    pub fn max_lookback() -> usize {
        Self::indicator_types()
            .iter()
            .map(IndicatorType::lookback)
            .max()
            .unwrap_or(0)
    }

    /// Runs every indicator once over an ascending history and zips the
    /// results by index. Value `i` only depends on points `0..=i`.
    pub fn compute_all(points: &[PricePoint]) -> Vec<IndicatorSnapshot> {
        let cols = PriceColumns::from_points(points);
        let closes = &cols.closes;

        let rsi14 = rsi(closes, rsi::DEFAULT_PERIOD);
        let macd = macd::macd_default(closes);
        let sma20 = sma(closes, 20);
        let sma50 = sma(closes, 50);
        let sma200 = sma(closes, 200);
        let ema12 = ema(closes, 12);
        let ema26 = ema(closes, 26);
        let bands = bollinger(closes, bollinger::DEFAULT_PERIOD, bollinger::DEFAULT_MULTIPLIER);
        let stoch = stochastic(
            &cols.highs,
            &cols.lows,
            closes,
            stochastic::DEFAULT_PERIOD,
            stochastic::DEFAULT_SMOOTH_K,
        );
        let atr14 = atr(&cols.highs, &cols.lows, closes, atr::DEFAULT_PERIOD);
        let adx14 = adx(&cols.highs, &cols.lows, closes, adx::DEFAULT_PERIOD);

        points
            .iter()
            .enumerate()
            .map(|(i, point)| IndicatorSnapshot {
                date: point.date,
                rsi14: rsi14[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                macd_histogram: macd.histogram[i],
                sma20: sma20[i],
                sma50: sma50[i],
                sma200: sma200[i],
                ema12: ema12[i],
                ema26: ema26[i],
                bollinger_upper: bands.upper[i],
                bollinger_middle: bands.middle[i],
                bollinger_lower: bands.lower[i],
                stochastic_k: stoch.k[i],
                stochastic_d: stoch.d[i],
                atr14: atr14[i],
                adx14: adx14[i],
            })
            .collect()
    }

    pub fn values(&self) -> [Option<f64>; 16] {
        [
            self.rsi14,
            self.macd,
            self.macd_signal,
            self.macd_histogram,
            self.sma20,
            self.sma50,
            self.sma200,
            self.ema12,
            self.ema26,
            self.bollinger_upper,
            self.bollinger_middle,
            self.bollinger_lower,
            self.stochastic_k,
            self.stochastic_d,
            self.atr14,
            self.adx14,
        ]
    }

    pub fn has_any_value(&self) -> bool {
        self.values().iter().any(Option::is_some)
    }
}
