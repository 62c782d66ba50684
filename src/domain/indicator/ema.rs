//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = (C[i] - EMA[i-1]) * k + EMA[i-1].
//! Warmup: first (n-1) values are undefined.

use crate::domain::series::{defined, ema_of_defined_tail, Series};

pub fn ema(values: &[f64], period: usize) -> Series {
    ema_of_defined_tail(&defined(values), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert!(series[2].is_some());
        assert!(series[3].is_some());
        assert!(series[4].is_some());
    }

    #[test]
    fn ema_period_1() {
        let series = ema(&[10.0, 20.0, 30.0], 1);

        assert_eq!(series, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_seed_is_sma() {
        let series = ema(&[10.0, 20.0, 30.0], 3);

        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((series[2].unwrap() - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((series[2].unwrap() - sma).abs() < f64::EPSILON);

        let ema_3 = (40.0 - sma) * k + sma;
        assert!((series[3].unwrap() - ema_3).abs() < 1e-12);

        let ema_4 = (50.0 - ema_3) * k + ema_3;
        assert!((series[4].unwrap() - ema_4).abs() < 1e-12);
    }

    #[test]
    fn ema_equal_prices() {
        let series = ema(&[100.0; 5], 3);

        for v in series.iter().skip(2) {
            assert!((v.unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_is_deterministic() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let a = ema(&prices, 12);
        let b = ema(&prices, 12);
        let bits = |s: &Series| -> Vec<Option<u64>> { s.iter().map(|v| v.map(f64::to_bits)).collect() };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn ema_empty_values() {
        assert!(ema(&[], 3).is_empty());
    }

    #[test]
    fn ema_period_0() {
        assert_eq!(ema(&[10.0, 20.0], 0), vec![None, None]);
    }
}
