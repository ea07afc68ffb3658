use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::{Config, DAX_COMPANIES, DEFAULT_PRICE_START, HTTP_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::store::prices::PriceStore;
use crate::types::PricePoint;

#[derive(Debug, Default)]
pub struct PriceFetchStats {
    pub tickers: usize,
    pub fetched_rows: usize,
    pub failed_tickers: usize,
    pub added: usize,
    pub total: usize,
}

/// Price scraping stage: fetch daily bars from the Yahoo chart API for
/// every ticker in the basket, resuming from the day after the most recent
/// stored date. Per-ticker failures are logged and the batch continues.
pub async fn run(cfg: &Config) -> Result<PriceFetchStats> {
    let store = PriceStore::new(cfg.prices_file());

    let start = match store.last_date()? {
        Some(last) => last + chrono::Duration::days(1),
        None => {
            let (y, m, d) = DEFAULT_PRICE_START;
            NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| AppError::Config("invalid DEFAULT_PRICE_START".to_string()))?
        }
    };
    let end = Utc::now().date_naive();
    if start > end {
        info!("price table already covers {end}; nothing to fetch");
        return Ok(PriceFetchStats::default());
    }
    info!("fetching prices from {start} to {end}");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let mut stats = PriceFetchStats {
        tickers: DAX_COMPANIES.len(),
        ..Default::default()
    };
    let mut batch: Vec<PricePoint> = Vec::new();

    for (company, ticker) in DAX_COMPANIES {
        match fetch_ticker(&client, cfg, company, ticker, start, end).await {
            Ok(points) => {
                if points.is_empty() {
                    info!("{company} ({ticker}): no new bars");
                } else {
                    info!("{company} ({ticker}): {} bars", points.len());
                }
                stats.fetched_rows += points.len();
                batch.extend(points);
            }
            Err(e) => {
                warn!("{company} ({ticker}): price fetch failed: {e}");
                stats.failed_tickers += 1;
            }
        }
    }

    let (added, total) = store.merge(batch)?;
    stats.added = added;
    stats.total = total;
    info!(
        "price scrape: {} rows fetched across {} tickers ({} failed); table: {} added, {} total",
        stats.fetched_rows, stats.tickers, stats.failed_tickers, stats.added, stats.total
    );
    Ok(stats)
}

async fn fetch_ticker(
    client: &reqwest::Client,
    cfg: &Config,
    company: &str,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>> {
    let period1 = start
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp())
        .unwrap_or_default();
    // period2 is exclusive; include the end day.
    let period2 = (end + chrono::Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp())
        .unwrap_or_default();

    let url = format!(
        "{}/{ticker}?period1={period1}&period2={period2}&interval=1d",
        cfg.chart_api_url
    );
    let resp: serde_json::Value = client
        .get(&url)
        .header("User-Agent", "Mozilla/5.0")
        .send()
        .await?
        .json()
        .await?;

    parse_chart_response(company, ticker, &resp)
}

/// Parse a Yahoo v8 chart payload into daily price points. Bars with a
/// null close are skipped; OHLC fields are carried when present.
pub fn parse_chart_response(
    company: &str,
    ticker: &str,
    resp: &serde_json::Value,
) -> Result<Vec<PricePoint>> {
    let chart = resp
        .get("chart")
        .ok_or_else(|| AppError::Api("chart response had no chart object".to_string()))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown chart error");
        return Err(AppError::Api(format!("{ticker}: {description}")));
    }

    let result = chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| AppError::Api(format!("{ticker}: empty chart result")))?;

    let timestamps = match result.get("timestamp").and_then(|t| t.as_array()) {
        Some(t) => t,
        // A valid response with no bars in the window.
        None => return Ok(Vec::new()),
    };

    let quote = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| AppError::Api(format!("{ticker}: missing quote indicators")))?;

    let series = |name: &str| -> Vec<Option<f64>> {
        quote
            .get(name)
            .and_then(|s| s.as_array())
            .map(|a| a.iter().map(|v| v.as_f64()).collect())
            .unwrap_or_default()
    };
    let opens = series("open");
    let highs = series("high");
    let lows = series("low");
    let closes = series("close");

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(ts) = ts.as_i64() else { continue };
        let Some(close) = closes.get(i).copied().flatten() else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|t| t.date_naive()) else {
            continue;
        };
        points.push(PricePoint {
            company: company.to_string(),
            ticker: ticker.to_string(),
            date,
            open: opens.get(i).copied().flatten(),
            high: highs.get(i).copied().flatten(),
            low: lows.get(i).copied().flatten(),
            close,
        });
    }
    Ok(points)
}
