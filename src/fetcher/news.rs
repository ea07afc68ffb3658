use std::time::Duration;

use chrono::NaiveDate;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::{
    Config, DAX_COMPANIES, HTTP_TIMEOUT_SECS, NEWS_DOMAINS, NEWS_FETCH_DELAY_MS,
    NEWS_LOOKBACK_DAYS, NEWS_SOURCES,
};
use crate::error::{AppError, Result};
use crate::store::articles::ArticleStore;
use crate::types::{parse_published_at, Article};

#[derive(Debug, Default)]
pub struct FetchStats {
    pub api_total: usize,
    pub with_date: usize,
    pub without_date: usize,
    pub failed_companies: usize,
}

/// News scraping stage: query NewsAPI for each company in the basket over
/// the lookback window and merge the results into the article table.
/// One failing company never aborts the others; a fixed courtesy delay
/// sits between requests.
pub async fn run(cfg: &Config) -> Result<FetchStats> {
    let Some(api_key) = cfg.news_api_key.clone() else {
        warn!("NEWS_API_KEY is not set; skipping the news scrape");
        return Ok(FetchStats::default());
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let to = Utc::now().date_naive();
    let from = to - chrono::Duration::days(NEWS_LOOKBACK_DAYS);

    let mut stats = FetchStats::default();
    let mut batch: Vec<Article> = Vec::new();

    for (i, (company, _ticker)) in DAX_COMPANIES.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(NEWS_FETCH_DELAY_MS)).await;
        }
        match fetch_company(&client, cfg, &api_key, company, from, to).await {
            Ok((articles, without_date)) => {
                stats.api_total += articles.len() + without_date;
                stats.with_date += articles.len();
                stats.without_date += without_date;
                info!(
                    "{company}: {} articles ({} without date dropped)",
                    articles.len() + without_date,
                    without_date
                );
                batch.extend(articles);
            }
            Err(e) => {
                warn!("{company}: news fetch failed: {e}");
                stats.failed_companies += 1;
            }
        }
    }

    let outcome = ArticleStore::new(cfg.articles_file()).merge(batch)?;
    info!(
        "news scrape: {} fetched ({} with date, {} without, {} companies failed); \
         article table: {} added, {} duplicates dropped, {} total",
        stats.api_total,
        stats.with_date,
        stats.without_date,
        stats.failed_companies,
        outcome.added,
        outcome.duplicates,
        outcome.total,
    );
    Ok(stats)
}

async fn fetch_company(
    client: &reqwest::Client,
    cfg: &Config,
    api_key: &str,
    company: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(Vec<Article>, usize)> {
    let url = format!("{}/everything", cfg.news_api_url);
    let resp: serde_json::Value = client
        .get(&url)
        .query(&[
            ("q", company),
            ("sources", NEWS_SOURCES),
            ("domains", NEWS_DOMAINS),
            ("from", &from.to_string()),
            ("to", &to.to_string()),
            ("sortBy", "relevancy"),
            ("language", "en"),
        ])
        .header("X-Api-Key", api_key)
        .send()
        .await?
        .json()
        .await?;

    parse_news_response(company, &resp)
}

/// Parse a NewsAPI /everything payload into articles for one company.
/// Returns the parsed articles plus the count of items dropped for a
/// missing or unparseable publish timestamp.
pub fn parse_news_response(
    company: &str,
    resp: &serde_json::Value,
) -> Result<(Vec<Article>, usize)> {
    let status = resp.get("status").and_then(|s| s.as_str()).unwrap_or("");
    if status != "ok" {
        let message = resp
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(AppError::Api(format!("NewsAPI: {message}")));
    }

    let items = resp
        .get("articles")
        .and_then(|a| a.as_array())
        .ok_or_else(|| AppError::Api("NewsAPI response had no articles array".to_string()))?;

    let mut articles = Vec::with_capacity(items.len());
    let mut without_date = 0usize;

    for item in items {
        let Some(url) = item.get("url").and_then(|u| u.as_str()) else {
            continue;
        };
        let published_at = item
            .get("publishedAt")
            .and_then(|p| p.as_str())
            .and_then(parse_published_at);
        let Some(published_at) = published_at else {
            without_date += 1;
            continue;
        };

        let title = item
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();
        let description = item
            .get("description")
            .and_then(|d| d.as_str())
            .map(str::to_string);
        let source = item
            .get("source")
            .and_then(|s| s.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("")
            .to_string();

        articles.push(Article {
            company_name: company.to_string(),
            title,
            description,
            url: url.to_string(),
            published_at,
            source,
        });
    }

    Ok((articles, without_date))
}
