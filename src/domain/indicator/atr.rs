//! Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR(n) = EMA(TR, n), so the first (n-1) values are undefined.

use crate::domain::series::{ema_of_defined_tail, Series};

pub const DEFAULT_PERIOD: usize = 14;

pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let len = highs.len().min(lows.len()).min(closes.len());
    (0..len)
        .map(|i| {
            let hl = highs[i] - lows[i];
            if i == 0 {
                hl
            } else {
                let prev_close = closes[i - 1];
                hl.max((highs[i] - prev_close).abs())
                    .max((lows[i] - prev_close).abs())
            }
        })
        .collect()
}

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Series {
    let tr: Series = true_range(highs, lows, closes)
        .into_iter()
        .map(Some)
        .collect();
    ema_of_defined_tail(&tr, period)
}
