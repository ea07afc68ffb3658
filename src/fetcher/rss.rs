use std::time::Duration;

use chrono::{DateTime, Utc};
use rss::Channel;
use tracing::{info, warn};

use crate::config::{Config, DAX_COMPANIES, HTTP_TIMEOUT_SECS, NEWS_FETCH_DELAY_MS, RSS_QUERY_AFTER};
use crate::error::Result;
use crate::store::articles::ArticleStore;
use crate::types::Article;

#[derive(Debug, Default)]
pub struct RssFetchStats {
    pub items: usize,
    pub with_date: usize,
    pub without_date: usize,
    pub failed_companies: usize,
}

/// Keyless article source: query the Google News RSS search feed for each
/// company in the basket and merge the results into the article table.
/// Feeds carry no description, so scored text is the title alone. One
/// failing company never aborts the others.
pub async fn run(cfg: &Config) -> Result<RssFetchStats> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let mut stats = RssFetchStats::default();
    let mut batch: Vec<Article> = Vec::new();

    for (i, (company, _ticker)) in DAX_COMPANIES.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(NEWS_FETCH_DELAY_MS)).await;
        }
        match fetch_company(&client, cfg, company).await {
            Ok((articles, without_date)) => {
                stats.items += articles.len() + without_date;
                stats.with_date += articles.len();
                stats.without_date += without_date;
                info!(
                    "{company}: {} feed items ({} without date dropped)",
                    articles.len() + without_date,
                    without_date
                );
                batch.extend(articles);
            }
            Err(e) => {
                warn!("{company}: RSS fetch failed: {e}");
                stats.failed_companies += 1;
            }
        }
    }

    let outcome = ArticleStore::new(cfg.articles_file()).merge(batch)?;
    info!(
        "RSS scrape: {} items ({} with date, {} without, {} companies failed); \
         article table: {} added, {} duplicates dropped, {} total",
        stats.items,
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
    company: &str,
) -> Result<(Vec<Article>, usize)> {
    let query = format!("{company} after:{RSS_QUERY_AFTER}");
    let bytes = client
        .get(&cfg.rss_url)
        .query(&[("q", query.as_str())])
        .header("User-Agent", "Mozilla/5.0")
        .send()
        .await?
        .bytes()
        .await?;

    let channel = Channel::read_from(&bytes[..])?;
    Ok(parse_rss_channel(company, &channel))
}

/// Turn an RSS channel into articles for one company. Items without a link
/// are skipped; items without a parseable publish date are counted and
/// dropped, matching the article table's timestamp requirement.
pub fn parse_rss_channel(company: &str, channel: &Channel) -> (Vec<Article>, usize) {
    let mut articles = Vec::with_capacity(channel.items().len());
    let mut without_date = 0usize;

    for item in channel.items() {
        let Some(url) = item.link() else { continue };
        let published_at = item
            .pub_date()
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|ts| ts.with_timezone(&Utc));
        let Some(published_at) = published_at else {
            without_date += 1;
            continue;
        };

        let title = strip_tags(item.title().unwrap_or(""));
        let source = item
            .source()
            .and_then(|s| s.title())
            .map(str::to_string)
            .unwrap_or_else(|| source_from_url(url));

        articles.push(Article {
            company_name: company.to_string(),
            title,
            // Feeds carry no article body.
            description: None,
            url: url.to_string(),
            published_at,
            source,
        });
    }

    (articles, without_date)
}

/// Remove markup from a feed title, keeping only the text content.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Fallback source name when the feed item names none: the first label of
/// the link's host with leading scheme and `www.` stripped, capitalized.
fn source_from_url(url: &str) -> String {
    let host = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    let label = host.split(['/', '.']).next().unwrap_or("");
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(xml: &str) -> Channel {
        Channel::read_from(xml.as_bytes()).unwrap()
    }

    #[test]
    fn parses_items_and_counts_missing_dates() {
        let feed = channel(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>search</title><link>x</link><description>x</description>
              <item>
                <title>Siemens &lt;b&gt;beats&lt;/b&gt; estimates</title>
                <link>https://news.google.com/rss/articles/abc</link>
                <pubDate>Wed, 01 Jan 2025 08:00:00 GMT</pubDate>
                <source url="https://www.reuters.com">Reuters</source>
              </item>
              <item>
                <title>No date here</title>
                <link>https://news.google.com/rss/articles/def</link>
              </item>
            </channel></rss>"#,
        );

        let (articles, without_date) = parse_rss_channel("Siemens", &feed);
        assert_eq!(articles.len(), 1);
        assert_eq!(without_date, 1);
        assert_eq!(articles[0].company_name, "Siemens");
        assert_eq!(articles[0].title, "Siemens beats estimates");
        assert_eq!(articles[0].source, "Reuters");
        assert_eq!(articles[0].description, None);
        assert_eq!(articles[0].text(), "Siemens beats estimates. ");
    }

    #[test]
    fn source_falls_back_to_link_host() {
        let feed = channel(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>search</title><link>x</link><description>x</description>
              <item>
                <title>Quarterly numbers</title>
                <link>https://www.handelsblatt.com/unternehmen/abc</link>
                <pubDate>Thu, 02 Jan 2025 09:00:00 GMT</pubDate>
              </item>
            </channel></rss>"#,
        );

        let (articles, _) = parse_rss_channel("BASF", &feed);
        assert_eq!(articles[0].source, "Handelsblatt");
    }

    #[test]
    fn items_without_links_are_skipped() {
        let feed = channel(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>search</title><link>x</link><description>x</description>
              <item>
                <title>Linkless</title>
                <pubDate>Thu, 02 Jan 2025 09:00:00 GMT</pubDate>
              </item>
            </channel></rss>"#,
        );

        let (articles, without_date) = parse_rss_channel("BASF", &feed);
        assert!(articles.is_empty());
        assert_eq!(without_date, 0);
    }
}
