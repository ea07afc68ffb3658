use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use tracing::{error, info};

use crate::config::{
    Config, ALERT_SENTIMENT_DROP, SENTIMENT_WINDOW, VOLATILITY_WINDOW, ZSCORE_WINDOW,
};
use crate::error::Result;
use crate::features::rolling;
use crate::store::features::FeatureStore;
use crate::store::prices::PriceStore;
use crate::types::{FeatureRow, PricePoint, SentimentBucket};
use crate::store;

/// Base columns of a feature row: the joined inputs before any derived
/// column is computed. Merges operate on these only; derived columns are
/// always recomputed over the full history.
#[derive(Debug, Clone)]
pub struct BaseRow {
    pub date: NaiveDate,
    pub avg_sentiment: f64,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub companies: usize,
    pub built: usize,
    pub skipped_no_overlap: usize,
    pub failed: usize,
}

/// Company names arrive from two independent scrapers; match them on a
/// trimmed, word-capitalized form (acronyms keep their casing).
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inner join of one company's daily sentiment and prices on date. Dates
/// present in only one input are dropped.
pub fn join_company(sentiment: &[(NaiveDate, f64)], prices: &[&PricePoint]) -> Vec<BaseRow> {
    let by_date: HashMap<NaiveDate, &PricePoint> = prices
        .iter()
        .map(|p| (p.date, *p))
        .collect();

    sentiment
        .iter()
        .filter_map(|&(date, avg_sentiment)| {
            by_date.get(&date).map(|p| BaseRow {
                date,
                avg_sentiment,
                close: p.close,
                open: p.open,
                high: p.high,
                low: p.low,
            })
        })
        .collect()
}

/// Concatenate the existing table's base columns with newly joined rows,
/// drop duplicate dates keeping the first occurrence (existing rows win),
/// and sort by date ascending.
pub fn merge_history(existing: Vec<FeatureRow>, new: Vec<BaseRow>) -> Vec<BaseRow> {
    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let mut combined: Vec<BaseRow> = Vec::with_capacity(existing.len() + new.len());

    let existing_base = existing.into_iter().map(|row| BaseRow {
        date: row.date,
        avg_sentiment: row.avg_sentiment,
        close: row.close,
        open: row.open,
        high: row.high,
        low: row.low,
    });

    for row in existing_base.chain(new) {
        if seen.insert(row.date) {
            combined.push(row);
        }
    }
    combined.sort_by_key(|row| row.date);
    combined
}

/// Recompute every derived column over the full sorted history.
pub fn compute_features(base: &[BaseRow]) -> Vec<FeatureRow> {
    let sentiment: Vec<f64> = base.iter().map(|r| r.avg_sentiment).collect();
    let close: Vec<f64> = base.iter().map(|r| r.close).collect();

    let sentiment_7d = rolling::rolling_mean(&sentiment, SENTIMENT_WINDOW);
    let sentiment_change = rolling::diff(&sentiment);
    let sentiment_lag1 = rolling::shift(&sentiment, 1);
    let sentiment_lag3 = rolling::shift(&sentiment, 3);
    let stock_price_return = rolling::pct_change(&close, 1);
    let return_7d = rolling::pct_change(&close, 7);
    let volatility_7d = rolling::rolling_std(&close, VOLATILITY_WINDOW);
    let sentiment_zscore = rolling::rolling_zscore(&sentiment, ZSCORE_WINDOW);

    base.iter()
        .enumerate()
        .map(|(i, row)| {
            let alert = sentiment_change[i].is_some_and(|c| c <= ALERT_SENTIMENT_DROP);
            let alert_combined =
                alert && stock_price_return[i].is_some_and(|r| r < 0.0);
            FeatureRow {
                date: row.date,
                avg_sentiment: row.avg_sentiment,
                close: row.close,
                open: row.open,
                high: row.high,
                low: row.low,
                sentiment_7d: sentiment_7d[i],
                sentiment_change: sentiment_change[i],
                sentiment_lag1: sentiment_lag1[i],
                sentiment_lag3: sentiment_lag3[i],
                stock_price_return: stock_price_return[i],
                return_7d: return_7d[i],
                volatility_7d: volatility_7d[i],
                sentiment_zscore: sentiment_zscore[i],
                alert,
                alert_combined,
                weekday: row.date.format("%A").to_string(),
                month: row.date.month(),
            }
        })
        .collect()
}

/// Feature-building stage: for every company present in both the daily
/// sentiment table and the price table, join, merge with any persisted
/// history, recompute derived columns, and overwrite the company's table.
/// Each company is an independent unit of work; failures are logged and
/// the batch continues.
pub fn run(cfg: &Config) -> Result<BuildSummary> {
    let (daily, dropped) =
        store::load_required::<SentimentBucket>(&cfg.daily_sentiment_file())?;
    if dropped > 0 {
        tracing::warn!("{dropped} daily sentiment rows dropped (malformed row)");
    }
    let prices = PriceStore::new(cfg.prices_file()).load_required()?;
    let feature_store = FeatureStore::new(cfg.company_data_dir());

    let mut sentiment_by_company: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for bucket in &daily {
        sentiment_by_company
            .entry(normalize_name(&bucket.company_name))
            .or_default()
            .push((bucket.period_start, bucket.avg_sentiment));
    }

    let mut prices_by_company: BTreeMap<String, Vec<&PricePoint>> = BTreeMap::new();
    for point in &prices {
        prices_by_company
            .entry(normalize_name(&point.company))
            .or_default()
            .push(point);
    }

    let mut summary = BuildSummary::default();
    for (company, sentiment_rows) in &sentiment_by_company {
        let Some(price_rows) = prices_by_company.get(company) else {
            continue;
        };
        summary.companies += 1;

        match build_company(&feature_store, company, sentiment_rows, price_rows) {
            Ok(true) => summary.built += 1,
            Ok(false) => {
                info!("{company}: no overlapping dates, skipping");
                summary.skipped_no_overlap += 1;
            }
            Err(e) => {
                error!("{company}: feature build failed: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "feature build: {} companies, {} built, {} skipped, {} failed",
        summary.companies, summary.built, summary.skipped_no_overlap, summary.failed
    );
    Ok(summary)
}

/// Returns Ok(false) when the join produced no rows (company skipped).
fn build_company(
    feature_store: &FeatureStore,
    company: &str,
    sentiment_rows: &[(NaiveDate, f64)],
    price_rows: &[&PricePoint],
) -> Result<bool> {
    let joined = join_company(sentiment_rows, price_rows);
    if joined.is_empty() {
        return Ok(false);
    }

    let existing = feature_store.load(company)?;
    let combined = merge_history(existing, joined);
    let rows = compute_features(&combined);
    feature_store.save(company, &rows)?;
    info!("{company}: {} feature rows written", rows.len());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Granularity;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn price(company: &str, day: u32, close: f64) -> PricePoint {
        PricePoint {
            company: company.to_string(),
            ticker: "TST.DE".to_string(),
            date: d(day),
            open: None,
            high: None,
            low: None,
            close,
        }
    }

    fn base(day: u32, avg_sentiment: f64, close: f64) -> BaseRow {
        BaseRow {
            date: d(day),
            avg_sentiment,
            close,
            open: None,
            high: None,
            low: None,
        }
    }

    #[test]
    fn join_is_inner_on_date() {
        let sentiment = vec![(d(1), 0.1), (d(2), 0.2), (d(3), 0.3), (d(5), 0.5)];
        let prices = [
            price("A", 1, 10.0),
            price("A", 2, 11.0),
            price("A", 3, 12.0),
            price("A", 4, 13.0),
        ];
        let refs: Vec<&PricePoint> = prices.iter().collect();
        let joined = join_company(&sentiment, &refs);
        let dates: Vec<NaiveDate> = joined.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn merge_existing_rows_win_on_duplicate_date() {
        let existing = compute_features(&[base(1, 0.2, 100.0)]);
        let new = vec![base(1, 0.9, 105.0), base(2, 0.3, 101.0)];
        let merged = merge_history(existing, new);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].date, d(1));
        assert_eq!(merged[0].close, 100.0);
        assert_eq!(merged[0].avg_sentiment, 0.2);
        assert_eq!(merged[1].close, 101.0);
    }

    #[test]
    fn merge_sorts_by_date_ascending() {
        let merged = merge_history(Vec::new(), vec![base(9, 0.1, 9.0), base(2, 0.2, 2.0)]);
        assert_eq!(merged[0].date, d(2));
        assert_eq!(merged[1].date, d(9));
    }

    #[test]
    fn alert_logic() {
        // Day 2 drops sentiment by 0.35 with a falling close; day 4 drops
        // by 0.35 with a rising close.
        let rows = compute_features(&[
            base(1, 0.30, 100.0),
            base(2, -0.05, 98.0),
            base(3, 0.30, 100.0),
            base(4, -0.05, 101.0),
        ]);
        assert!(!rows[0].alert);
        assert!(rows[1].alert);
        assert!(rows[1].alert_combined);
        assert!(rows[3].alert);
        assert!(!rows[3].alert_combined);
    }

    #[test]
    fn derived_columns_on_short_history() {
        let rows = compute_features(&[base(1, 0.1, 100.0), base(2, 0.2, 102.0)]);
        assert_eq!(rows[0].sentiment_change, None);
        assert_eq!(rows[0].stock_price_return, None);
        assert!(!rows[0].alert);
        assert!((rows[1].stock_price_return.unwrap() - 0.02).abs() < 1e-12);
        assert_eq!(rows[1].sentiment_lag1, Some(0.1));
        assert_eq!(rows[1].sentiment_7d, None);
        assert_eq!(rows[1].weekday, "Tuesday");
        assert_eq!(rows[1].month, 1);
    }

    #[test]
    fn normalize_capitalizes_words_without_mangling_acronyms() {
        assert_eq!(normalize_name("  daimler truck "), "Daimler Truck");
        assert_eq!(normalize_name("BMW"), "BMW");
        assert_eq!(normalize_name("siemens"), "Siemens");
    }

    fn test_config(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            log_level: "info".to_string(),
            news_api_key: None,
            news_api_url: String::new(),
            chart_api_url: String::new(),
            rss_url: String::new(),
        }
    }

    fn write_daily(cfg: &Config, buckets: &[SentimentBucket]) {
        store::save_rows(&cfg.daily_sentiment_file(), buckets).unwrap();
    }

    fn bucket(company: &str, day: u32, avg: f64) -> SentimentBucket {
        SentimentBucket {
            company_name: company.to_string(),
            period_start: Granularity::Day.period_start(d(day)),
            avg_sentiment: avg,
        }
    }

    #[test]
    fn no_overlap_company_produces_no_file_and_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        write_daily(&cfg, &[bucket("Siemens", 1, 0.4)]);
        PriceStore::new(cfg.prices_file())
            .merge(vec![price("Siemens", 2, 100.0), price("BASF", 1, 44.0)])
            .unwrap();

        let summary = run(&cfg).unwrap();
        assert_eq!(summary.built, 0);
        assert_eq!(summary.skipped_no_overlap, 1);
        let feature_store = FeatureStore::new(cfg.company_data_dir());
        assert!(!feature_store.exists("Siemens"));
        assert!(!feature_store.exists("BASF"));
    }

    #[test]
    fn build_then_rebuild_preserves_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        let prices_store = PriceStore::new(cfg.prices_file());

        write_daily(&cfg, &[bucket("Siemens", 1, 0.4), bucket("Siemens", 2, 0.1)]);
        prices_store
            .merge(vec![price("Siemens", 1, 100.0), price("Siemens", 2, 102.0)])
            .unwrap();
        let first = run(&cfg).unwrap();
        assert_eq!(first.built, 1);

        // A later run sees a revised close for day 2; the stored row wins.
        write_daily(&cfg, &[bucket("Siemens", 2, 0.9), bucket("Siemens", 3, 0.2)]);
        store::save_rows(
            &cfg.prices_file(),
            &[price("Siemens", 2, 999.0), price("Siemens", 3, 103.0)],
        )
        .unwrap();
        let second = run(&cfg).unwrap();
        assert_eq!(second.built, 1);

        let rows = FeatureStore::new(cfg.company_data_dir()).load("Siemens").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].close, 102.0);
        assert_eq!(rows[1].avg_sentiment, 0.1);
        assert_eq!(rows[2].close, 103.0);
        // Derived columns recomputed over the merged history.
        assert!((rows[2].stock_price_return.unwrap() - (103.0 / 102.0 - 1.0)).abs() < 1e-12);
    }
}
