//! Persistence for summaries and aggregates.
//!
//! Summaries are CSV files with one row per learner; aggregates are JSON.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::learner::SummaryRow;

/// Writes summary rows to `path`, replacing any previous file.
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing summary CSV");

    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    if rows.is_empty() {
        writer.write_record(["Name", "Grade", "Gender", "Literacy Level", "Numeracy Level"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a summary CSV written by [`write_summary`].
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: SummaryRow = result?;
        rows.push(row);
    }

    Ok(rows)
}

/// Serializes a value as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
