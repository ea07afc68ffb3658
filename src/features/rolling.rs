//! Trailing-window statistics over a date-sorted series.
//!
//! All functions take the full sorted history and return one value per
//! input row, `None` where the trailing window is not yet filled. Standard
//! deviations are sample deviations (n − 1 denominator).

/// Trailing mean over `window` rows; `None` until the window is filled.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            Some(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Trailing sample standard deviation over `window` rows.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if window < 2 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (window as f64 - 1.0);
            Some(var.sqrt())
        })
        .collect()
}

/// Row-over-row difference: `x(t) − x(t−1)`; first row `None`.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| if i == 0 { None } else { Some(v - values[i - 1]) })
        .collect()
}

/// Series shifted forward by `n` rows; first `n` rows `None`.
pub fn shift(values: &[f64], n: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| if i < n { None } else { Some(values[i - n]) })
        .collect()
}

/// Relative change over `n` rows: `x(t) / x(t−n) − 1`; first `n` rows `None`.
/// A zero base yields `None` rather than an infinity.
pub fn pct_change(values: &[f64], n: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if i < n {
                return None;
            }
            let base = values[i - n];
            if base == 0.0 {
                return None;
            }
            Some(v / base - 1.0)
        })
        .collect()
}

/// `(x − trailing mean) / trailing sample std` over `window` rows.
/// `None` on unfilled windows and wherever the window has zero variance
/// (division by zero is undefined, not an error).
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let means = rolling_mean(values, window);
    let stds = rolling_std(values, window);
    values
        .iter()
        .zip(means.iter().zip(stds.iter()))
        .map(|(v, (mean, std))| match (mean, std) {
            (Some(m), Some(s)) if *s > 0.0 => {
                let z = (v - m) / s;
                z.is_finite().then_some(z)
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_needs_full_window() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn constant_series_boundary() {
        // 8-row constant close: pct_change is 0 from row 2 on, undefined on
        // row 1; the 7-row variant is undefined through row 7.
        let close = [100.0; 8];
        let ret = pct_change(&close, 1);
        assert_eq!(ret[0], None);
        assert!(ret[1..].iter().all(|r| *r == Some(0.0)));

        let ret7 = pct_change(&close, 7);
        assert!(ret7[..7].iter().all(Option::is_none));
        assert_eq!(ret7[7], Some(0.0));

        let vol = rolling_std(&close, 7);
        assert!(vol[..6].iter().all(Option::is_none));
        assert_eq!(vol[6], Some(0.0));
    }

    #[test]
    fn rolling_std_is_sample_deviation() {
        let out = rolling_std(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 7);
        let last = out[6].unwrap();
        // Sample std of 1..=7: sqrt(28 / 6).
        assert!((last - (28.0f64 / 6.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn diff_and_shift() {
        let xs = [1.0, 3.0, 2.0];
        assert_eq!(diff(&xs), vec![None, Some(2.0), Some(-1.0)]);
        assert_eq!(shift(&xs, 1), vec![None, Some(1.0), Some(3.0)]);
        assert_eq!(shift(&xs, 3), vec![None, None, None]);
    }

    #[test]
    fn zscore_undefined_on_zero_variance() {
        let flat = [0.5; 5];
        assert!(rolling_zscore(&flat, 3).iter().all(Option::is_none));

        let xs = [1.0, 2.0, 3.0];
        let z = rolling_zscore(&xs, 3);
        assert_eq!(z[0], None);
        assert_eq!(z[1], None);
        // (3 - 2) / 1 = 1 for the filled window.
        assert!((z[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pct_change_zero_base_is_undefined() {
        assert_eq!(pct_change(&[0.0, 5.0], 1), vec![None, None]);
    }
}
