use std::collections::HashSet;
use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;
use crate::types::{Article, ScoredArticle};

/// Outcome of merging a scraped batch into the article table.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub existing: usize,
    pub added: usize,
    pub duplicates: usize,
    pub total: usize,
}

/// The raw article table, keyed by url. Append-only: merging keeps the
/// first occurrence of every url, so re-running a scrape with the same
/// batch is a no-op.
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the stored table. Rows with unparseable timestamps are dropped
    /// and counted; a missing file is an empty table.
    pub fn load(&self) -> Result<Vec<Article>> {
        let (rows, dropped) = super::load_rows_lossy::<Article>(&self.path)?;
        if dropped > 0 {
            warn!("{dropped} article rows dropped (unparseable timestamp or malformed row)");
        }
        Ok(rows)
    }

    /// Load the table, erroring if the file does not exist (for stages that
    /// cannot run without it).
    pub fn load_required(&self) -> Result<Vec<Article>> {
        let (rows, dropped) = super::load_required::<Article>(&self.path)?;
        if dropped > 0 {
            warn!("{dropped} article rows dropped (unparseable timestamp or malformed row)");
        }
        Ok(rows)
    }

    /// Merge a scraped batch into the table: existing rows first, then new
    /// rows, deduplicated by url keeping the first occurrence.
    pub fn merge(&self, batch: Vec<Article>) -> Result<MergeOutcome> {
        let existing = self.load()?;
        let mut outcome = MergeOutcome {
            existing: existing.len(),
            ..Default::default()
        };

        let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + batch.len());
        let mut combined = Vec::with_capacity(existing.len() + batch.len());
        for article in existing.into_iter().chain(batch) {
            if seen.insert(article.url.clone()) {
                combined.push(article);
            } else {
                outcome.duplicates += 1;
            }
        }

        combined.sort_by(|a, b| {
            (a.company_name.as_str(), a.published_at).cmp(&(b.company_name.as_str(), b.published_at))
        });

        outcome.total = combined.len();
        outcome.added = outcome.total - outcome.existing;
        super::save_rows(&self.path, &combined)?;
        Ok(outcome)
    }
}

/// The scored-sentiment table. Rows are written once and never recomputed;
/// the scorer skips articles whose url is already present.
pub struct ScoredArticleStore {
    path: PathBuf,
}

impl ScoredArticleStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Vec<ScoredArticle>> {
        let (rows, dropped) = super::load_rows_lossy::<ScoredArticle>(&self.path)?;
        if dropped > 0 {
            warn!("{dropped} scored rows dropped (malformed row)");
        }
        Ok(rows)
    }

    pub fn load_required(&self) -> Result<Vec<ScoredArticle>> {
        let (rows, dropped) = super::load_required::<ScoredArticle>(&self.path)?;
        if dropped > 0 {
            warn!("{dropped} scored rows dropped (malformed row)");
        }
        Ok(rows)
    }

    pub fn save(&self, rows: &[ScoredArticle]) -> Result<()> {
        super::save_rows(&self.path, rows)
    }
}
