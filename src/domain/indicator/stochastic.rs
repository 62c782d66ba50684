//! Stochastic Oscillator.
//!
//! raw %K = (C - LL(n)) / (HH(n) - LL(n)) * 100, or 50 when HH == LL.
//! %K = SMA(raw %K, smooth_k), %D = SMA(%K, smooth_d).

use crate::domain::series::{defined, rolling_max, rolling_mean, rolling_min, Series};

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_SMOOTH_K: usize = 3;
pub const DEFAULT_SMOOTH_D: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
}

pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smooth_k: usize,
) -> StochasticSeries {
    stochastic_with_d(highs, lows, closes, period, smooth_k, DEFAULT_SMOOTH_D)
}

pub fn stochastic_with_d(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smooth_k: usize,
    smooth_d: usize,
) -> StochasticSeries {
    let highest = rolling_max(&defined(highs), period);
    let lowest = rolling_min(&defined(lows), period);

    let raw: Series = closes
        .iter()
        .zip(highest.iter().zip(&lowest))
        .map(|(&close, window)| match window {
            (Some(hh), Some(ll)) => {
                let range = hh - ll;
                Some(if range == 0.0 {
                    50.0
                } else {
                    (close - ll) / range * 100.0
                })
            }
            _ => None,
        })
        .collect();

    let k = rolling_mean(&raw, smooth_k);
    let d = rolling_mean(&k, smooth_d);
    StochasticSeries { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stochastic_warmup() {
        let highs = vec![11.0; 10];
        let lows = vec![9.0; 10];
        let closes = vec![10.0; 10];
        let out = stochastic(&highs, &lows, &closes, 3, 2);

        // raw from 2, %K from 3, %D from 5
        assert!(out.k[2].is_none());
        assert!(out.k[3].is_some());
        assert!(out.d[4].is_none());
        assert!(out.d[5].is_some());
    }

    #[test]
    fn stochastic_close_at_high_is_100() {
        let highs = [10.0, 11.0, 12.0, 13.0];
        let lows = [8.0, 9.0, 10.0, 11.0];
        let closes = [10.0, 11.0, 12.0, 13.0];
        let out = stochastic_with_d(&highs, &lows, &closes, 2, 1, 1);
        assert!((out.k[1].unwrap() - 100.0).abs() < 1e-12);
        assert!((out.k[3].unwrap() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn stochastic_zero_range_is_50() {
        let flat = [5.0; 6];
        let out = stochastic_with_d(&flat, &flat, &flat, 3, 1, 1);
        for v in out.k.iter().flatten() {
            assert_eq!(*v, 50.0);
        }
        assert_eq!(out.k.iter().flatten().count(), 4);
    }

    #[test]
    fn stochastic_smoothing() {
        let highs = [10.0, 10.0, 10.0, 10.0];
        let lows = [0.0, 0.0, 0.0, 0.0];
        let closes = [2.0, 4.0, 6.0, 8.0];
        let out = stochastic_with_d(&highs, &lows, &closes, 1, 2, 2);
        // raw = 20, 40, 60, 80; %K = 30, 50, 70; %D = 40, 60
        assert!((out.k[1].unwrap() - 30.0).abs() < 1e-12);
        assert!((out.k[3].unwrap() - 70.0).abs() < 1e-12);
        assert!((out.d[2].unwrap() - 40.0).abs() < 1e-12);
        assert!((out.d[3].unwrap() - 60.0).abs() < 1e-12);
    }

    #[test]
    fn stochastic_in_range() {
        let closes: Vec<f64> = (0..30).map(|i| 20.0 + (i as f64 * 0.9).sin() * 3.0).collect();
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        let out = stochastic(&highs, &lows, &closes, DEFAULT_PERIOD, DEFAULT_SMOOTH_K);
        for v in out.k.iter().chain(&out.d).flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }
}
