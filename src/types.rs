use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::label_thresholds;

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// One scraped news article. Identity is the article url; the stores drop
/// duplicate urls keeping the first occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub company_name: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "publishedAt", with = "published_at_format")]
    pub published_at: DateTime<Utc>,
    pub source: String,
}

impl Article {
    /// Text handed to the sentiment scorer: title + ". " + description,
    /// with an empty string standing in for a missing description.
    pub fn text(&self) -> String {
        format!("{}. {}", self.title, self.description.as_deref().unwrap_or(""))
    }
}

/// An article plus its sentiment columns. Written once and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub company_name: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "publishedAt", with = "published_at_format")]
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

impl ScoredArticle {
    pub fn from_article(article: Article, score: f64, label: SentimentLabel) -> Self {
        Self {
            company_name: article.company_name,
            title: article.title,
            description: article.description,
            url: article.url,
            published_at: article.published_at,
            source: article.source,
            sentiment_score: score,
            sentiment_label: label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Pure threshold mapping from a compound score in [-1, 1].
    pub fn from_compound(compound: f64) -> Self {
        if compound > label_thresholds::POSITIVE_MIN {
            SentimentLabel::Positive
        } else if compound < label_thresholds::NEGATIVE_MAX {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        };
        write!(f, "{s}")
    }
}

/// Article timestamps on the wire come in a few shapes (RFC 3339 from
/// NewsAPI, space-separated or date-only from older table versions).
/// Rows whose timestamp fits none of them fail deserialization and are
/// dropped by the store with a logged count.
mod published_at_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(naive.and_utc());
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
        None
    }
}

pub use published_at_format::parse as parse_published_at;

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// One daily close. Identity is (company, date); OHLC columns are optional
/// and only feed the report's candlestick capability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: Option<f64>,
    #[serde(rename = "High")]
    pub high: Option<f64>,
    #[serde(rename = "Low")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: f64,
}

// ---------------------------------------------------------------------------
// Aggregated sentiment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Truncate a date to the start of its bucket: the date itself for Day,
    /// the ISO-week Monday for Week, the first of the month for Month.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Granularity::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Granularity::Day => "daily",
            Granularity::Week => "weekly",
            Granularity::Month => "monthly",
        };
        write!(f, "{s}")
    }
}

/// Mean sentiment for one (company, period) bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentBucket {
    pub company_name: String,
    pub period_start: NaiveDate,
    pub avg_sentiment: f64,
}

// ---------------------------------------------------------------------------
// Per-company feature table
// ---------------------------------------------------------------------------

/// One row of a per-company feature table. `date`, `avg_sentiment`, `close`
/// and the OHLC columns are base columns carried through merges; everything
/// else is recomputed over the full sorted history on every run.
///
/// Only the three mandatory base columns are required on read. Older or
/// reduced tables may lack any of the other columns; those fields come
/// back as their defaults so the report can degrade per view instead of
/// dropping every row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub avg_sentiment: f64,
    pub close: f64,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub sentiment_7d: Option<f64>,
    #[serde(default)]
    pub sentiment_change: Option<f64>,
    #[serde(default)]
    pub sentiment_lag1: Option<f64>,
    #[serde(default)]
    pub sentiment_lag3: Option<f64>,
    #[serde(default)]
    pub stock_price_return: Option<f64>,
    #[serde(default)]
    pub return_7d: Option<f64>,
    #[serde(default)]
    pub volatility_7d: Option<f64>,
    #[serde(default)]
    pub sentiment_zscore: Option<f64>,
    #[serde(default)]
    pub alert: bool,
    #[serde(default)]
    pub alert_combined: bool,
    #[serde(default)]
    pub weekday: String,
    #[serde(default)]
    pub month: u32,
}
