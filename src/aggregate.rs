use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::store;
use crate::store::articles::ScoredArticleStore;
use crate::types::{Granularity, ScoredArticle, SentimentBucket};

/// Mean sentiment per (company, period) bucket at the given granularity.
/// Always a full recompute over the entire scored set; output is sorted by
/// (company, period_start) so identical input yields identical tables.
pub fn aggregate(scored: &[ScoredArticle], granularity: Granularity) -> Vec<SentimentBucket> {
    let mut groups: BTreeMap<(String, NaiveDate), (f64, usize)> = BTreeMap::new();
    for row in scored {
        let period = granularity.period_start(row.published_at.date_naive());
        let entry = groups.entry((row.company_name.clone(), period)).or_insert((0.0, 0));
        entry.0 += row.sentiment_score;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((company_name, period_start), (sum, count))| SentimentBucket {
            company_name,
            period_start,
            avg_sentiment: sum / count as f64,
        })
        .collect()
}

/// Aggregation stage: read the scored table, write one table per
/// granularity (daily, weekly, monthly).
pub fn run(cfg: &Config) -> Result<()> {
    let scored = ScoredArticleStore::new(cfg.full_sentiment_file()).load_required()?;

    for (granularity, path) in [
        (Granularity::Day, cfg.daily_sentiment_file()),
        (Granularity::Week, cfg.weekly_sentiment_file()),
        (Granularity::Month, cfg.monthly_sentiment_file()),
    ] {
        let buckets = aggregate(&scored, granularity);
        write_buckets(&path, &buckets)?;
        info!(
            "{granularity} aggregation: {} buckets from {} scored articles",
            buckets.len(),
            scored.len()
        );
    }
    Ok(())
}

fn write_buckets(path: &Path, buckets: &[SentimentBucket]) -> Result<()> {
    store::save_rows(path, buckets)
}
