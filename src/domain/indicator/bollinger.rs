//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the population standard deviation (divides by N, not N-1)
//! of the same window the middle band averages.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) values are undefined.

use crate::domain::series::{defined, rolling_mean, rolling_stddev, zip_with, Series};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

pub fn bollinger(values: &[f64], period: usize, multiplier: f64) -> BollingerSeries {
    let input = defined(values);
    let middle = rolling_mean(&input, period);
    let stddev = rolling_stddev(&input, period);

    BollingerSeries {
        upper: zip_with(&middle, &stddev, |m, sd| m + multiplier * sd),
        lower: zip_with(&middle, &stddev, |m, sd| m - multiplier * sd),
        middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_warmup() {
        let out = bollinger(&[1.0, 2.0, 3.0, 4.0], 3, 2.0);
        assert!(out.middle[1].is_none());
        assert!(out.upper[1].is_none());
        assert!(out.lower[1].is_none());
        assert!(out.middle[2].is_some());
    }

    #[test]
    fn bollinger_known_values() {
        // window [2, 4, 6, 8]: mean 5, population variance 5
        let out = bollinger(&[2.0, 4.0, 6.0, 8.0], 4, 2.0);
        let sd = 5.0_f64.sqrt();
        assert!((out.middle[3].unwrap() - 5.0).abs() < 1e-12);
        assert!((out.upper[3].unwrap() - (5.0 + 2.0 * sd)).abs() < 1e-12);
        assert!((out.lower[3].unwrap() - (5.0 - 2.0 * sd)).abs() < 1e-12);
    }

    #[test]
    fn bollinger_band_ordering() {
        let values: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 1.3).sin() * 4.0).collect();
        let out = bollinger(&values, DEFAULT_PERIOD, DEFAULT_MULTIPLIER);
        for i in 19..40 {
            let (u, m, l) = (
                out.upper[i].unwrap(),
                out.middle[i].unwrap(),
                out.lower[i].unwrap(),
            );
            assert!(u >= m && m >= l);
        }
    }

    #[test]
    fn bollinger_flat_prices_collapse() {
        let out = bollinger(&[10.0; 5], 3, 2.0);
        for i in 2..5 {
            assert_eq!(out.upper[i], Some(10.0));
            assert_eq!(out.lower[i], Some(10.0));
        }
    }

    #[test]
    fn bollinger_period_zero() {
        let out = bollinger(&[1.0, 2.0], 0, 2.0);
        assert_eq!(out.middle, vec![None, None]);
    }
}
