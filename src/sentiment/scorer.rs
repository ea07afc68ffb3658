use std::collections::HashSet;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::sentiment::analyzer::SentimentAnalyzer;
use crate::store::articles::{ArticleStore, ScoredArticleStore};
use crate::types::ScoredArticle;

#[derive(Debug, Default)]
pub struct ScoreSummary {
    pub scanned: usize,
    pub already_scored: usize,
    pub newly_scored: usize,
    pub total: usize,
}

/// Incremental scoring stage: score only articles whose url is not yet in
/// the scored table, append them, and persist the combined set. Previously
/// scored rows are never touched, so scores are stable across runs.
pub fn run(cfg: &Config) -> Result<ScoreSummary> {
    let articles = ArticleStore::new(cfg.articles_file()).load_required()?;
    let store = ScoredArticleStore::new(cfg.full_sentiment_file());
    let mut combined = store.load()?;

    let mut known: HashSet<String> = combined.iter().map(|r| r.url.clone()).collect();
    let mut summary = ScoreSummary {
        scanned: articles.len(),
        ..Default::default()
    };

    let analyzer = SentimentAnalyzer::new();
    for article in articles {
        if !known.insert(article.url.clone()) {
            summary.already_scored += 1;
            continue;
        }
        let (score, label) = analyzer.score(&article.text());
        combined.push(ScoredArticle::from_article(article, score, label));
        summary.newly_scored += 1;
    }

    summary.total = combined.len();
    if summary.newly_scored == 0 {
        info!("no new articles to score ({} already scored)", summary.already_scored);
        return Ok(summary);
    }

    store.save(&combined)?;
    info!(
        "scored {} new articles ({} skipped as already scored, {} total)",
        summary.newly_scored, summary.already_scored, summary.total
    );
    Ok(summary)
}
