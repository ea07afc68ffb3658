use chrono::NaiveDate;

use crate::types::FeatureRow;

/// One step of the toy long-only backtest.
#[derive(Debug)]
pub struct BacktestResult {
    pub date: NaiveDate,
    /// 1.0 while the alert rule holds a position, 0.0 otherwise.
    pub position: f64,
    /// Previous position times today's stock return.
    pub strategy_return: Option<f64>,
    pub cumulative_strategy: Option<f64>,
    pub cumulative_stock: Option<f64>,
}

/// Simulate the alert-following rule over a feature table: enter (1/0)
/// wherever `alert` is set, earn the next row's stock return while
/// positioned, and track cumulative products of (1 + return) for both the
/// strategy and buy-and-hold. Rows whose return is undefined contribute no
/// factor; the running products resume on the next defined row.
pub fn run(rows: &[FeatureRow]) -> Vec<BacktestResult> {
    let mut results = Vec::with_capacity(rows.len());
    let mut prev_position = 0.0;
    let mut cum_strategy = 1.0;
    let mut cum_stock = 1.0;

    for row in rows {
        let strategy_return = row.stock_price_return.map(|r| prev_position * r);

        let cumulative_strategy = strategy_return.map(|r| {
            cum_strategy *= 1.0 + r;
            cum_strategy
        });
        let cumulative_stock = row.stock_price_return.map(|r| {
            cum_stock *= 1.0 + r;
            cum_stock
        });

        let position = if row.alert { 1.0 } else { 0.0 };
        results.push(BacktestResult {
            date: row.date,
            position,
            strategy_return,
            cumulative_strategy,
            cumulative_stock,
        });
        prev_position = position;
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::builder::{compute_features, BaseRow};

    fn base(day: u32, avg_sentiment: f64, close: f64) -> BaseRow {
        BaseRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            avg_sentiment,
            close,
            open: None,
            high: None,
            low: None,
        }
    }

    #[test]
    fn no_alert_means_flat_strategy() {
        let rows = compute_features(&[
            base(1, 0.1, 100.0),
            base(2, 0.1, 110.0),
            base(3, 0.1, 99.0),
        ]);
        let results = run(&rows);
        assert_eq!(results[0].strategy_return, None);
        assert_eq!(results[1].strategy_return, Some(0.0));
        assert_eq!(results[2].strategy_return, Some(0.0));
        assert!((results[2].cumulative_strategy.unwrap() - 1.0).abs() < 1e-12);
        assert!((results[2].cumulative_stock.unwrap() - 0.99).abs() < 1e-12);
    }

    #[test]
    fn position_earns_next_day_return() {
        // Day 2 trips the alert (sentiment falls 0.4); day 3 gains 10%.
        let rows = compute_features(&[
            base(1, 0.4, 100.0),
            base(2, 0.0, 100.0),
            base(3, 0.0, 110.0),
        ]);
        assert!(rows[1].alert);

        let results = run(&rows);
        assert_eq!(results[1].position, 1.0);
        // Day 2's own return is earned at day 1's position (flat).
        assert_eq!(results[1].strategy_return, Some(0.0));
        // Day 3 earns the 10% at day 2's position.
        assert!((results[2].strategy_return.unwrap() - 0.1).abs() < 1e-12);
        assert!((results[2].cumulative_strategy.unwrap() - 1.1).abs() < 1e-12);
        assert!((results[2].cumulative_stock.unwrap() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn first_row_has_no_cumulative_value() {
        let rows = compute_features(&[base(1, 0.1, 100.0), base(2, 0.1, 101.0)]);
        let results = run(&rows);
        assert_eq!(results[0].cumulative_strategy, None);
        assert_eq!(results[0].cumulative_stock, None);
        assert!(results[1].cumulative_stock.is_some());
    }
}
