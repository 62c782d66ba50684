//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) values are undefined.

use crate::domain::series::{defined, rolling_mean, Series};

pub fn sma(values: &[f64], period: usize) -> Series {
    rolling_mean(&defined(values), period)
}
