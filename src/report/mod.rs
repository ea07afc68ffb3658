pub mod backtest;
pub mod stats;

use tracing::warn;

use crate::config::{Config, ALERT_SENTIMENT_DROP, MAX_CORRELATION_LAG};
use crate::error::{AppError, Result};
use crate::features::builder::normalize_name;
use crate::features::rolling;
use crate::store;
use crate::store::features::FeatureStore;
use crate::types::FeatureRow;

/// Default z-score alert threshold when none is given on the command line.
const DEFAULT_ZSCORE_THRESHOLD: f64 = -1.0;

/// The text views rendered over a company's feature table. Each view
/// declares the columns it needs; a view whose columns are missing from
/// the persisted header is skipped with a warning instead of failing the
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    ZScore,
    Candlestick,
    Alerts,
    ZScoreAlerts,
    CorrelationMatrix,
    LaggedCorrelation,
    MovingAverages,
    Histogram,
    Backtest,
}

impl View {
    pub const ALL: &'static [View] = &[
        View::Summary,
        View::ZScore,
        View::Candlestick,
        View::Alerts,
        View::ZScoreAlerts,
        View::CorrelationMatrix,
        View::LaggedCorrelation,
        View::MovingAverages,
        View::Histogram,
        View::Backtest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            View::Summary => "summary",
            View::ZScore => "z-score",
            View::Candlestick => "candlestick",
            View::Alerts => "alerts",
            View::ZScoreAlerts => "z-score alerts",
            View::CorrelationMatrix => "correlation matrix",
            View::LaggedCorrelation => "lagged correlation",
            View::MovingAverages => "moving averages",
            View::Histogram => "sentiment histogram",
            View::Backtest => "backtest",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            View::Summary => &["date", "avg_sentiment", "close"],
            View::ZScore => &["date", "sentiment_zscore"],
            View::Candlestick => &["date", "open", "high", "low", "close"],
            View::Alerts => &["date", "avg_sentiment", "sentiment_change", "close"],
            View::ZScoreAlerts => &["date", "sentiment_zscore", "close"],
            View::CorrelationMatrix => &["avg_sentiment"],
            View::LaggedCorrelation => &["avg_sentiment", "stock_price_return"],
            View::MovingAverages => &["date", "close"],
            View::Histogram => &["avg_sentiment"],
            View::Backtest => &["date", "alert", "stock_price_return"],
        }
    }

    pub fn is_available(&self, headers: &[String]) -> bool {
        self.required_columns()
            .iter()
            .all(|col| headers.iter().any(|h| h == col))
    }
}

/// Correlation-matrix candidates; restricted to the columns actually
/// present in the table.
const CORRELATION_COLUMNS: &[&str] = &[
    "avg_sentiment",
    "sentiment_7d",
    "sentiment_zscore",
    "close",
    "stock_price_return",
    "return_7d",
];

/// Report stage: render every available view of one company's feature
/// table to stdout. The alert thresholds are user-adjustable; missing
/// columns degrade the dependent view, never the run.
pub fn run(
    cfg: &Config,
    company: &str,
    alert_threshold: Option<f64>,
    zscore_threshold: Option<f64>,
) -> Result<()> {
    let company = normalize_name(company);
    let feature_store = FeatureStore::new(cfg.company_data_dir());
    let path = feature_store.path_for(&company);
    if !path.exists() {
        return Err(AppError::MissingInput(format!(
            "no feature table for '{company}' (expected {}); run the features stage first",
            path.display()
        )));
    }

    let headers = store::read_headers(&path)?;
    let rows = feature_store.load(&company)?;
    if rows.is_empty() {
        return Err(AppError::MissingInput(format!(
            "feature table for '{company}' is empty"
        )));
    }

    let alert_threshold = alert_threshold.unwrap_or(ALERT_SENTIMENT_DROP);
    let zscore_threshold = zscore_threshold.unwrap_or(DEFAULT_ZSCORE_THRESHOLD);

    println!("=== {company} ===");
    for view in View::ALL {
        if !view.is_available(&headers) {
            warn!("view '{}' skipped: missing columns", view.name());
            continue;
        }
        match view {
            View::Summary => render_summary(&rows),
            View::ZScore => render_zscore(&rows),
            View::Candlestick => render_candlestick(&rows),
            View::Alerts => render_alerts(&rows, alert_threshold),
            View::ZScoreAlerts => render_zscore_alerts(&rows, zscore_threshold),
            View::CorrelationMatrix => render_correlation_matrix(&rows, &headers),
            View::LaggedCorrelation => render_lagged_correlation(&rows),
            View::MovingAverages => render_moving_averages(&rows),
            View::Histogram => render_histogram(&rows),
            View::Backtest => render_backtest(&rows),
        }
    }
    Ok(())
}

fn render_summary(rows: &[FeatureRow]) {
    let first = &rows[0];
    let last = &rows[rows.len() - 1];
    let mean_sentiment =
        rows.iter().map(|r| r.avg_sentiment).sum::<f64>() / rows.len() as f64;
    println!("\n[summary]");
    println!("rows: {} ({} to {})", rows.len(), first.date, last.date);
    println!(
        "last close: {:.2} | last sentiment: {:+.3} | mean sentiment: {:+.3}",
        last.close, last.avg_sentiment, mean_sentiment
    );
}

fn render_zscore(rows: &[FeatureRow]) {
    let defined: Vec<f64> = rows.iter().filter_map(|r| r.sentiment_zscore).collect();
    println!("\n[z-score]");
    if defined.is_empty() {
        println!("no defined z-scores yet (window not filled)");
        return;
    }
    let min = defined.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = defined.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let last = rows.iter().rev().find_map(|r| r.sentiment_zscore);
    println!(
        "defined: {} rows | min {:+.2} | max {:+.2} | latest {}",
        defined.len(),
        min,
        max,
        last.map(|z| format!("{z:+.2}")).unwrap_or_else(|| "n/a".to_string())
    );
}

fn render_candlestick(rows: &[FeatureRow]) {
    let complete = rows
        .iter()
        .filter(|r| r.open.is_some() && r.high.is_some() && r.low.is_some())
        .count();
    println!("\n[candlestick]");
    if complete == 0 {
        println!("no rows with full OHLC data");
    } else {
        println!("{complete} of {} rows carry full OHLC data", rows.len());
    }
}

fn render_alerts(rows: &[FeatureRow], threshold: f64) {
    let hits: Vec<&FeatureRow> = rows
        .iter()
        .filter(|r| r.sentiment_change.is_some_and(|c| c <= threshold))
        .collect();
    println!("\n[alerts] sentiment change <= {threshold:+.2}");
    if hits.is_empty() {
        println!("none");
        return;
    }
    for row in hits {
        println!(
            "{} | sentiment {:+.3} (change {:+.3}) | close {:.2} | return {}",
            row.date,
            row.avg_sentiment,
            row.sentiment_change.unwrap_or(0.0),
            row.close,
            fmt_opt(row.stock_price_return),
        );
    }
}

fn render_zscore_alerts(rows: &[FeatureRow], threshold: f64) {
    let hits: Vec<&FeatureRow> = rows
        .iter()
        .filter(|r| r.sentiment_zscore.is_some_and(|z| z <= threshold))
        .collect();
    println!("\n[z-score alerts] z <= {threshold:+.2}");
    if hits.is_empty() {
        println!("none");
        return;
    }
    for row in hits {
        println!(
            "{} | z {:+.2} | close {:.2} | return {}",
            row.date,
            row.sentiment_zscore.unwrap_or(0.0),
            row.close,
            fmt_opt(row.stock_price_return),
        );
    }
}

fn column_values(rows: &[FeatureRow], name: &str) -> Vec<Option<f64>> {
    rows.iter()
        .map(|r| match name {
            "avg_sentiment" => Some(r.avg_sentiment),
            "sentiment_7d" => r.sentiment_7d,
            "sentiment_zscore" => r.sentiment_zscore,
            "close" => Some(r.close),
            "stock_price_return" => r.stock_price_return,
            "return_7d" => r.return_7d,
            _ => None,
        })
        .collect()
}

fn render_correlation_matrix(rows: &[FeatureRow], headers: &[String]) {
    let columns: Vec<(&str, Vec<Option<f64>>)> = CORRELATION_COLUMNS
        .iter()
        .filter(|name| headers.iter().any(|h| h == *name))
        .map(|&name| (name, column_values(rows, name)))
        .collect();

    let matrix = stats::correlation_matrix(&columns);
    println!("\n[correlation matrix]");
    print!("{:>20}", "");
    for (name, _) in &columns {
        print!("{name:>20}");
    }
    println!();
    for (i, (name, _)) in columns.iter().enumerate() {
        print!("{name:>20}");
        for entry in &matrix[i] {
            print!("{:>20}", fmt_opt(*entry));
        }
        println!();
    }
}

fn render_lagged_correlation(rows: &[FeatureRow]) {
    let returns = column_values(rows, "stock_price_return");
    let sentiment = column_values(rows, "avg_sentiment");
    println!("\n[lagged correlation] corr(return(t), sentiment(t - lag))");
    for (lag, corr) in stats::lagged_correlation(&returns, &sentiment, MAX_CORRELATION_LAG) {
        println!("lag {lag:+} | {}", fmt_opt(corr));
    }
}

fn render_moving_averages(rows: &[FeatureRow]) {
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let ma7 = rolling::rolling_mean(&close, 7);
    let ma30 = rolling::rolling_mean(&close, 30);
    println!("\n[moving averages]");
    println!(
        "latest close {:.2} | MA7 {} | MA30 {}",
        close[close.len() - 1],
        fmt_opt(*ma7.last().unwrap_or(&None)),
        fmt_opt(*ma30.last().unwrap_or(&None)),
    );
}

fn render_histogram(rows: &[FeatureRow]) {
    // Ten equal bins across [-1, 1].
    let mut bins = [0usize; 10];
    for row in rows {
        let clamped = row.avg_sentiment.clamp(-1.0, 1.0);
        let idx = (((clamped + 1.0) / 2.0) * 10.0).floor() as usize;
        bins[idx.min(9)] += 1;
    }
    println!("\n[sentiment histogram]");
    for (i, count) in bins.iter().enumerate() {
        let lo = -1.0 + i as f64 * 0.2;
        println!("[{:+.1}, {:+.1}) {:>5} {}", lo, lo + 0.2, count, "#".repeat(*count));
    }
}

fn render_backtest(rows: &[FeatureRow]) {
    let results = backtest::run(rows);
    println!("\n[backtest] long 1/0 on alert, next-day returns");
    let last_strategy = results.iter().rev().find_map(|r| r.cumulative_strategy);
    let last_stock = results.iter().rev().find_map(|r| r.cumulative_stock);
    let days_in = results.iter().filter(|r| r.position > 0.0).count();
    println!(
        "days in position: {days_in}/{} | cumulative strategy {} | cumulative stock {}",
        results.len(),
        fmt_opt(last_strategy),
        fmt_opt(last_stock),
    );
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:+.4}")).unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn views_check_required_columns() {
        let full = headers(&[
            "date", "avg_sentiment", "close", "open", "high", "low",
            "sentiment_change", "stock_price_return", "sentiment_zscore", "alert",
        ]);
        assert!(View::Summary.is_available(&full));
        assert!(View::Candlestick.is_available(&full));
        assert!(View::Backtest.is_available(&full));

        let reduced = headers(&["date", "avg_sentiment", "close"]);
        assert!(View::Summary.is_available(&reduced));
        assert!(!View::ZScore.is_available(&reduced));
        assert!(!View::Candlestick.is_available(&reduced));
        assert!(!View::Backtest.is_available(&reduced));
    }

    #[test]
    fn every_view_declares_columns() {
        for view in View::ALL {
            assert!(!view.required_columns().is_empty(), "{}", view.name());
        }
    }

    #[test]
    fn reduced_schema_table_degrades_per_view() {
        // A table with only the mandatory base columns must still load and
        // render the views those columns support; the rest are skipped.
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            data_dir: dir.path().to_path_buf(),
            log_level: "info".to_string(),
            news_api_key: None,
            news_api_url: String::new(),
            chart_api_url: String::new(),
            rss_url: String::new(),
        };
        let company_dir = cfg.company_data_dir();
        std::fs::create_dir_all(&company_dir).unwrap();
        std::fs::write(
            company_dir.join("Siemens.csv"),
            "date,avg_sentiment,close\n\
             2024-01-02,0.2,100.0\n\
             2024-01-03,-0.1,101.0\n",
        )
        .unwrap();

        let rows = FeatureStore::new(cfg.company_data_dir()).load("Siemens").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sentiment_change, None);
        assert!(!rows[0].alert);

        assert!(run(&cfg, "Siemens", None, None).is_ok());
    }
}
