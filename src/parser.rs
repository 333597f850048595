//! Reader for raw per-school assessment exports.
//!
//! An export starts with a header line and [`METADATA_ROWS`] metadata records,
//! followed by one record per learner laid out as [`RAW_COLUMNS`].

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::debug;

use crate::learner::{Gender, LearnerRecord};
use crate::schema::{
    FIRST_INDICATOR_COLUMN, GENDER_COLUMN, GRADE_COLUMN, INDICATOR_COUNT, METADATA_ROWS,
    NAME_COLUMN, RAW_COLUMNS,
};

/// Structural problems that make a raw export unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("header has {found} columns, expected {expected}")]
    HeaderWidth { found: usize, expected: usize },
    #[error("record {record} has {found} fields, expected at most {expected}")]
    RecordWidth {
        record: usize,
        found: usize,
        expected: usize,
    },
}

/// Parses a raw export file into learner records.
pub fn parse_school_file(path: &Path) -> Result<Vec<LearnerRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_school_csv(file)
}

/// Parses a raw export from any reader.
///
/// # Errors
///
/// Returns an error if the CSV is unreadable or does not match the fixed
/// 20-column layout (see [`SchemaError`]). Short learner records are padded
/// with empty cells.
pub fn parse_school_csv<R: Read>(reader: R) -> Result<Vec<LearnerRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let width = rdr.headers()?.len();
    if width != RAW_COLUMNS.len() {
        return Err(SchemaError::HeaderWidth {
            found: width,
            expected: RAW_COLUMNS.len(),
        }
        .into());
    }

    let mut learners = Vec::new();
    for (i, result) in rdr.records().enumerate().skip(METADATA_ROWS) {
        let record = result?;
        if record.len() > RAW_COLUMNS.len() {
            return Err(SchemaError::RecordWidth {
                record: i + 1,
                found: record.len(),
                expected: RAW_COLUMNS.len(),
            }
            .into());
        }
        learners.push(learner_from_record(&record));
    }

    debug!(learners = learners.len(), "Parsed raw export");
    Ok(learners)
}

fn learner_from_record(record: &StringRecord) -> LearnerRecord {
    let cell = |i: usize| record.get(i).unwrap_or("").trim();

    let mut indicators = [0.0; INDICATOR_COUNT];
    for (offset, value) in indicators.iter_mut().enumerate() {
        *value = coerce_indicator(cell(FIRST_INDICATOR_COLUMN + offset));
    }

    LearnerRecord::from_indicators(
        cell(NAME_COLUMN),
        cell(GRADE_COLUMN),
        Gender::from_code(cell(GENDER_COLUMN)),
        indicators,
    )
}

/// Best-effort numeric coercion: anything that is not a finite number is 0.
pub fn coerce_indicator(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
