//! Average Directional Index.
//!
//! +DM = H[i] - H[i-1] when it exceeds L[i-1] - L[i] and is positive, else 0
//! (and symmetrically for -DM). +DM, -DM and TR are averaged over the
//! trailing n steps, +DI/-DI = 100 * avg_dm / avg_tr, and
//! DX = 100 * |+DI - -DI| / (+DI + -DI).
//!
//! The reported value is the per-step DX, defined once 2n observations
//! exist. It is not smoothed a second time.

use crate::domain::indicator::true_range;
use crate::domain::series::{rolling_mean, Series};

pub const DEFAULT_PERIOD: usize = 14;

pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Series {
    let tr = true_range(highs, lows, closes);
    let len = tr.len();
    let mut out = vec![None; len];
    if period == 0 || len < 2 * period {
        return out;
    }

    let mut plus_dm = vec![None; len];
    let mut minus_dm = vec![None; len];
    let mut tr_steps = vec![None; len];
    for i in 1..len {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        plus_dm[i] = Some(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm[i] = Some(if down > up && down > 0.0 { down } else { 0.0 });
        tr_steps[i] = Some(tr[i]);
    }

    let avg_plus = rolling_mean(&plus_dm, period);
    let avg_minus = rolling_mean(&minus_dm, period);
    let avg_tr = rolling_mean(&tr_steps, period);

    for i in (2 * period - 1)..len {
        if let (Some(p), Some(m), Some(t)) = (avg_plus[i], avg_minus[i], avg_tr[i]) {
            let (plus_di, minus_di) = if t == 0.0 {
                (0.0, 0.0)
            } else {
                (100.0 * p / t, 100.0 * m / t)
            };
            let di_sum = plus_di + minus_di;
            out[i] = Some(if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            });
        }
    }

    out
}
