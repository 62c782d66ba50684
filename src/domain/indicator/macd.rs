//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) over the defined part of the MACD line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is defined from max(fast, slow) - 1, the signal and
//! histogram from max(fast, slow) - 1 + signal - 1.

use crate::domain::indicator::ema;
use crate::domain::series::{ema_of_defined_tail, zip_with, Series};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let ema_fast = ema(values, fast);
    let ema_slow = ema(values, slow);

    let line = zip_with(&ema_fast, &ema_slow, |f, s| f - s);
    let signal = ema_of_defined_tail(&line, signal_period);
    let histogram = zip_with(&line, &signal, |m, s| m - s);

    MacdSeries {
        macd: line,
        signal,
        histogram,
    }
}

pub fn macd_default(values: &[f64]) -> MacdSeries {
    macd(values, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5 + (i as f64).sin()).collect()
    }

    #[test]
    fn macd_lengths_match_input() {
        let values = trending(50);
        let out = macd_default(&values);
        assert_eq!(out.macd.len(), 50);
        assert_eq!(out.signal.len(), 50);
        assert_eq!(out.histogram.len(), 50);
    }

    #[test]
    fn macd_warmup_boundaries() {
        let out = macd_default(&trending(50));

        assert!(out.macd[24].is_none());
        assert!(out.macd[25].is_some());
        assert!(out.signal[32].is_none());
        assert!(out.signal[33].is_some());
        assert!(out.histogram[32].is_none());
        assert!(out.histogram[33].is_some());
    }

    #[test]
    fn macd_line_is_ema_spread() {
        let values = trending(40);
        let out = macd_default(&values);
        let fast = ema(&values, DEFAULT_FAST);
        let slow = ema(&values, DEFAULT_SLOW);

        for i in 25..40 {
            let expected = fast[i].unwrap() - slow[i].unwrap();
            assert!((out.macd[i].unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_signal_seed_is_mean_of_first_lines() {
        let values = trending(40);
        let out = macd(&values, 3, 5, 4);
        // line defined from index 4; signal seeds at 4 + 4 - 1 = 7
        let seed: f64 = (4..=7).map(|i| out.macd[i].unwrap()).sum::<f64>() / 4.0;
        assert!((out.signal[7].unwrap() - seed).abs() < 1e-12);
        assert!(out.signal[6].is_none());
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let out = macd_default(&trending(60));
        for i in 33..60 {
            let h = out.macd[i].unwrap() - out.signal[i].unwrap();
            assert!((out.histogram[i].unwrap() - h).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_flat_prices_zero() {
        let out = macd_default(&[100.0; 40]);
        for i in 33..40 {
            assert!(out.macd[i].unwrap().abs() < 1e-10);
            assert!(out.signal[i].unwrap().abs() < 1e-10);
            assert!(out.histogram[i].unwrap().abs() < 1e-10);
        }
    }

    #[test]
    fn macd_short_history_has_no_signal() {
        let out = macd_default(&trending(30));
        assert!(out.macd[29].is_some());
        assert!(out.signal.iter().all(Option::is_none));
        assert!(out.histogram.iter().all(Option::is_none));
    }

    #[test]
    fn macd_empty() {
        let out = macd_default(&[]);
        assert!(out.macd.is_empty());
    }
}
