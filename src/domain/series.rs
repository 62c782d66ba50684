//! Windowed numeric operations shared by every indicator.
//!
//! A series is `Vec<Option<f64>>` aligned index-for-index with the price
//! history. `None` marks "not yet computable" and is never coerced to zero:
//! a window containing any `None` produces `None`.

pub type Series = Vec<Option<f64>>;

/// Lifts a plain slice into a fully defined series.
pub fn defined(values: &[f64]) -> Series {
    values.iter().map(|&v| Some(v)).collect()
}

/// Applies `f` to each trailing window of `period` values. Indices before
/// `period - 1`, and windows holding an undefined value, map to `None`.
fn rolling<F>(values: &[Option<f64>], period: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let mut window: Vec<f64> = Vec::with_capacity(period);
    for i in (period - 1)..values.len() {
        window.clear();
        for v in &values[i + 1 - period..=i] {
            match v {
                Some(x) => window.push(*x),
                None => break,
            }
        }
        if window.len() == period {
            out[i] = Some(f(&window));
        }
    }
    out
}

pub fn rolling_sum(values: &[Option<f64>], period: usize) -> Series {
    rolling(values, period, |w| w.iter().sum())
}

pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Series {
    rolling(values, period, |w| mean(w))
}

/// Population variance (divides by N) of each trailing window, measured
/// around that window's own mean.
pub fn rolling_variance(values: &[Option<f64>], period: usize) -> Series {
    rolling(values, period, |w| variance(w))
}

pub fn rolling_stddev(values: &[Option<f64>], period: usize) -> Series {
    rolling(values, period, |w| variance(w).sqrt())
}

pub fn rolling_max(values: &[Option<f64>], period: usize) -> Series {
    rolling(values, period, |w| w.iter().copied().fold(f64::MIN, f64::max))
}

pub fn rolling_min(values: &[Option<f64>], period: usize) -> Series {
    rolling(values, period, |w| w.iter().copied().fold(f64::MAX, f64::min))
}

/// EMA over the trailing run of defined values, seeded with the SMA of the
/// first `period` values of that run and left-padded with `None`.
///
/// Anything before the last undefined value is ignored, so a gap restarts
/// the average rather than bridging it with a made-up number.
pub fn ema_of_defined_tail(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let start = values
        .iter()
        .rposition(|v| v.is_none())
        .map_or(0, |i| i + 1);
    let tail: Vec<f64> = values[start..].iter().flatten().copied().collect();
    if tail.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = mean(&tail[..period]);
    out[start + period - 1] = Some(ema);
    for (offset, &value) in tail.iter().enumerate().skip(period) {
        ema = (value - ema) * k + ema;
        out[start + offset] = Some(ema);
    }
    out
}

/// Element-wise combination that is defined only where both inputs are.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rolling_sum_warmup_is_undefined() {
        let out = rolling_sum(&defined(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn rolling_mean_period_longer_than_series() {
        let out = rolling_mean(&defined(&[1.0, 2.0]), 5);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn rolling_period_zero_is_all_undefined() {
        let out = rolling_mean(&defined(&[1.0, 2.0]), 0);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn undefined_input_poisons_window() {
        let input = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let out = rolling_sum(&input, 2);
        assert_eq!(out, vec![None, None, None, Some(7.0), Some(9.0)]);
    }

    #[test]
    fn population_variance() {
        // mean 5, squared deviations 9+1+1+9 = 20, /4 = 5
        let out = rolling_variance(&defined(&[2.0, 4.0, 6.0, 8.0]), 4);
        assert_relative_eq!(out[3].unwrap(), 5.0);
        let sd = rolling_stddev(&defined(&[2.0, 4.0, 6.0, 8.0]), 4);
        assert_relative_eq!(sd[3].unwrap(), 5.0_f64.sqrt());
    }

    #[test]
    fn rolling_extremes() {
        let input = defined(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(
            rolling_max(&input, 3),
            vec![None, None, Some(4.0), Some(4.0), Some(5.0)]
        );
        assert_eq!(
            rolling_min(&input, 3),
            vec![None, None, Some(1.0), Some(1.0), Some(1.0)]
        );
    }

    #[test]
    fn ema_tail_skips_leading_undefined() {
        let input = vec![None, None, Some(10.0), Some(20.0), Some(30.0)];
        let out = ema_of_defined_tail(&input, 2);
        assert_eq!(out[0], None);
        assert_eq!(out[2], None);
        assert_relative_eq!(out[3].unwrap(), 15.0);
        // k = 2/3: (30 - 15) * 2/3 + 15 = 25
        assert_relative_eq!(out[4].unwrap(), 25.0);
    }

    #[test]
    fn ema_tail_restarts_after_gap() {
        let input = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(6.0)];
        let out = ema_of_defined_tail(&input, 2);
        assert_eq!(&out[..4], &[None, None, None, None]);
        assert_relative_eq!(out[4].unwrap(), 5.0);
    }

    #[test]
    fn zip_with_requires_both_sides() {
        let a = vec![Some(1.0), None, Some(3.0)];
        let b = vec![Some(1.0), Some(2.0), None];
        assert_eq!(zip_with(&a, &b, |x, y| x + y), vec![Some(2.0), None, None]);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
    }
}
