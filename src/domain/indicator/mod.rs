//! Technical indicator implementations.
//!
//! Every function is pure and returns a series aligned with its input,
//! `None` until the lookback has enough history:
//! - `sma`, `ema`: moving averages
//! - `rsi`: Wilder-smoothed relative strength
//! - `macd`: EMA spread with signal line and histogram
//! - `bollinger`: SMA ± k population standard deviations
//! - `stochastic`: smoothed %K and %D
//! - `atr`, `adx`: range and trend-strength measures over high/low/close
//!
//! [`IndicatorSnapshot`] bundles them per date for storage.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod stochastic;

pub use adx::adx;
pub use atr::{atr, true_range};
pub use bollinger::{bollinger, BollingerSeries};
pub use ema::ema;
pub use macd::{macd, MacdSeries};
pub use rsi::rsi;
pub use sma::sma;
pub use snapshot::IndicatorSnapshot;
pub use stochastic::{stochastic, StochasticSeries};

use std::fmt;

/// Indicator identity plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        period: usize,
        smooth_k: usize,
        smooth_d: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Number of observations needed before the first defined value.
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorType::Sma(n) | IndicatorType::Ema(n) | IndicatorType::Atr(n) => n,
            IndicatorType::Rsi(n) => n + 1,
            IndicatorType::Adx(n) => 2 * n,
            IndicatorType::Macd { fast, slow, signal } => fast.max(slow) + signal - 1,
            IndicatorType::Stochastic {
                period,
                smooth_k,
                smooth_d,
            } => period + smooth_k + smooth_d - 2,
            IndicatorType::Bollinger { period, .. } => period,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic {
                period,
                smooth_k,
                smooth_d,
            } => write!(f, "STOCHASTIC({},{},{})", period, smooth_k, smooth_d),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
