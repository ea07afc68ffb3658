use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;
use crate::types::FeatureRow;

/// Per-company feature tables, one CSV per company under the company-data
/// directory. The filename is derived from the company name with spaces
/// replaced by underscores, so each table is strictly scoped to a single
/// company and date dedup can never collide across companies.
pub struct FeatureStore {
    dir: PathBuf,
}

impl FeatureStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, company: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", company.replace(' ', "_")))
    }

    pub fn exists(&self, company: &str) -> bool {
        self.path_for(company).exists()
    }

    /// Load a company's persisted table; derived columns come back too but
    /// callers only trust the base columns (everything else is recomputed).
    pub fn load(&self, company: &str) -> Result<Vec<FeatureRow>> {
        let (rows, dropped) = super::load_rows_lossy::<FeatureRow>(&self.path_for(company))?;
        if dropped > 0 {
            warn!("{company}: {dropped} feature rows dropped (malformed row)");
        }
        Ok(rows)
    }

    /// Overwrite the company's table with the full recomputed history.
    pub fn save(&self, company: &str, rows: &[FeatureRow]) -> Result<()> {
        super::save_rows(&self.path_for(company), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_replaces_spaces() {
        let store = FeatureStore::new(PathBuf::from("/tmp/company_data"));
        assert_eq!(
            store.path_for("Daimler Truck"),
            PathBuf::from("/tmp/company_data/Daimler_Truck.csv")
        );
        assert_eq!(
            store.path_for("SAP"),
            PathBuf::from("/tmp/company_data/SAP.csv")
        );
    }
}
