pub mod articles;
pub mod features;
pub mod prices;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Read every row of a CSV table, skipping rows that fail to deserialize.
/// Returns the parsed rows and the number of skipped rows so callers can
/// log a dropped-row count. A missing file is an empty table, not an error.
pub(crate) fn load_rows_lossy<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize)> {
    if !path.exists() {
        return Ok((Vec::new(), 0));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.deserialize() {
        match record {
            Ok(row) => rows.push(row),
            Err(_) => dropped += 1,
        }
    }
    Ok((rows, dropped))
}

/// Read a table that must exist (mandatory stage input).
pub(crate) fn load_required<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize)> {
    if !path.exists() {
        return Err(AppError::MissingInput(format!(
            "required input file not found: {}",
            path.display()
        )));
    }
    load_rows_lossy(path)
}

/// Write a full table atomically: serialize to a sibling tmp file, then
/// rename over the target. A failed run never leaves a partial table.
pub(crate) fn save_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Column names of a persisted table, for capability checks against a
/// view's required column set.
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}
