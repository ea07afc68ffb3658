//! Correlation helpers for the report views. All statistics are
//! pairwise-complete: rows where either side is undefined are ignored.

/// Pearson correlation over the pairwise-complete observations.
/// `None` with fewer than two complete pairs or zero variance on a side.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then_some(r)
}

/// Full correlation matrix over named columns; entry (i, j) is the
/// pairwise-complete pearson correlation of columns i and j.
pub fn correlation_matrix(columns: &[(&str, Vec<Option<f64>>)]) -> Vec<Vec<Option<f64>>> {
    columns
        .iter()
        .map(|(_, xs)| {
            columns
                .iter()
                .map(|(_, ys)| pearson(xs, ys))
                .collect()
        })
        .collect()
}

/// Shift a series by `lag` rows; negative lags pull future values.
fn shift_by(xs: &[Option<f64>], lag: i64) -> Vec<Option<f64>> {
    (0..xs.len() as i64)
        .map(|i| {
            let j = i - lag;
            if (0..xs.len() as i64).contains(&j) {
                xs[j as usize]
            } else {
                None
            }
        })
        .collect()
}

/// Correlation of `returns(t)` against `sentiment(t − lag)` for every lag
/// in `−max_lag..=max_lag`. A positive lag asks whether earlier sentiment
/// predicts later returns.
pub fn lagged_correlation(
    returns: &[Option<f64>],
    sentiment: &[Option<f64>],
    max_lag: i64,
) -> Vec<(i64, Option<f64>)> {
    (-max_lag..=max_lag)
        .map(|lag| (lag, pearson(returns, &shift_by(sentiment, lag))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(xs: &[f64]) -> Vec<Option<f64>> {
        xs.iter().copied().map(Some).collect()
    }

    #[test]
    fn perfectly_correlated_series() {
        let xs = some(&[1.0, 2.0, 3.0, 4.0]);
        let ys = some(&[2.0, 4.0, 6.0, 8.0]);
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);

        let neg = some(&[4.0, 3.0, 2.0, 1.0]);
        assert!((pearson(&xs, &neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn incomplete_pairs_are_skipped() {
        let xs = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let ys = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        // Only rows 0 and 3 are complete; two points correlate exactly.
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_yield_none() {
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
        assert_eq!(pearson(&some(&[5.0, 5.0, 5.0]), &some(&[1.0, 2.0, 3.0])), None);
        assert_eq!(pearson(&[None, None], &[Some(1.0), Some(2.0)]), None);
    }

    #[test]
    fn matrix_diagonal_is_one() {
        let cols = vec![
            ("a", some(&[1.0, 2.0, 3.0])),
            ("b", some(&[3.0, 1.0, 2.0])),
        ];
        let m = correlation_matrix(&cols);
        assert!((m[0][0].unwrap() - 1.0).abs() < 1e-12);
        assert!((m[1][1].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m[0][1], m[1][0]);
    }

    #[test]
    fn lag_aligns_sentiment_with_later_returns() {
        // Returns copy sentiment one row later: lag +1 should be perfect.
        let sentiment = some(&[0.1, 0.5, -0.2, 0.3, 0.0]);
        let returns = vec![None, Some(0.1), Some(0.5), Some(-0.2), Some(0.3)];
        let lags = lagged_correlation(&returns, &sentiment, 2);
        let at = |lag: i64| lags.iter().find(|(l, _)| *l == lag).unwrap().1;
        assert!((at(1).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(lags.len(), 5);
    }
}
