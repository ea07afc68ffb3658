use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::Result;
use crate::types::PricePoint;

/// The daily price table, keyed by (company, date). Merging keeps the
/// first occurrence per key, so already-stored closes win over refetched
/// ones and re-runs are no-ops.
pub struct PriceStore {
    path: PathBuf,
}

impl PriceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Vec<PricePoint>> {
        let (rows, dropped) = super::load_rows_lossy::<PricePoint>(&self.path)?;
        if dropped > 0 {
            warn!("{dropped} price rows dropped (malformed row)");
        }
        Ok(rows)
    }

    pub fn load_required(&self) -> Result<Vec<PricePoint>> {
        let (rows, dropped) = super::load_required::<PricePoint>(&self.path)?;
        if dropped > 0 {
            warn!("{dropped} price rows dropped (malformed row)");
        }
        Ok(rows)
    }

    /// Most recent date across the whole table; the scraper resumes from
    /// the following day.
    pub fn last_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.load()?.iter().map(|p| p.date).max())
    }

    /// Merge freshly fetched rows: existing first, then new, deduplicated
    /// by (company, date) keeping the first occurrence, sorted by
    /// (company, date).
    pub fn merge(&self, batch: Vec<PricePoint>) -> Result<(usize, usize)> {
        let existing = self.load()?;
        let before = existing.len();

        let mut seen: HashSet<(String, NaiveDate)> =
            HashSet::with_capacity(existing.len() + batch.len());
        let mut combined = Vec::with_capacity(existing.len() + batch.len());
        for point in existing.into_iter().chain(batch) {
            if seen.insert((point.company.clone(), point.date)) {
                combined.push(point);
            }
        }

        combined.sort_by(|a, b| (a.company.as_str(), a.date).cmp(&(b.company.as_str(), b.date)));
        let total = combined.len();
        super::save_rows(&self.path, &combined)?;
        Ok((total - before, total))
    }
}
