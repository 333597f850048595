//! Data types produced by the aggregation stage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::band::Band;
use crate::schema::Domain;

/// Learner counts for the four bands of one grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    #[serde(rename = "Below Expectations")]
    pub below: usize,
    #[serde(rename = "Approaching Expectations")]
    pub approaching: usize,
    #[serde(rename = "Meets Expectations")]
    pub meets: usize,
    #[serde(rename = "Above Expectations")]
    pub above: usize,
}

impl BandCounts {
    pub fn get(&self, band: Band) -> usize {
        match band {
            Band::Below => self.below,
            Band::Approaching => self.approaching,
            Band::Meets => self.meets,
            Band::Above => self.above,
        }
    }

    pub fn increment(&mut self, band: Band) {
        match band {
            Band::Below => self.below += 1,
            Band::Approaching => self.approaching += 1,
            Band::Meets => self.meets += 1,
            Band::Above => self.above += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.below + self.approaching + self.meets + self.above
    }
}

/// Learner counts per (grade, band). Grades iterate in label order; a band a
/// grade never reached reads as 0. Learners with a blank grade have no row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GradeBandTable {
    rows: BTreeMap<String, BandCounts>,
}

impl GradeBandTable {
    pub fn record(&mut self, grade: &str, band: Band) {
        let grade = grade.trim();
        if grade.is_empty() {
            return;
        }
        self.rows.entry(grade.to_string()).or_default().increment(band);
    }

    pub fn count(&self, grade: &str, band: Band) -> usize {
        self.rows.get(grade).map_or(0, |counts| counts.get(band))
    }

    pub fn grades(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &BandCounts)> {
        self.rows.iter().map(|(grade, counts)| (grade.as_str(), counts))
    }

    /// Sum over every cell of the table.
    pub fn total(&self) -> usize {
        self.rows.values().map(BandCounts::total).sum()
    }

    /// Largest single cell, used to scale chart axes.
    pub fn max_count(&self) -> usize {
        self.rows
            .values()
            .flat_map(|counts| Band::ALL.map(|band| counts.get(band)))
            .max()
            .unwrap_or(0)
    }

    /// Largest per-grade total, used to scale stacked charts.
    pub fn max_grade_total(&self) -> usize {
        self.rows.values().map(BandCounts::total).max().unwrap_or(0)
    }
}

/// Count and share of learners in one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandTally {
    pub band: Band,
    pub count: usize,
    pub percentage: f64,
}

/// Summary statistics for one school in one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolAggregate {
    pub school_name: String,
    pub domain: Domain,
    pub total_learners: usize,
    /// Learners whose level maps to no band. Counted in `total_learners` only.
    pub unspecified: usize,
    /// One entry per band, in [`Band::ALL`] order.
    pub bands: Vec<BandTally>,
    pub by_grade: GradeBandTable,
}

impl SchoolAggregate {
    pub fn tally(&self, band: Band) -> Option<&BandTally> {
        self.bands.iter().find(|t| t.band == band)
    }
}

/// Both domain aggregates of one school, written as `<school>_aggregate.json`.
#[derive(Debug, Serialize)]
pub struct SchoolReport {
    pub schema_version: u8,
    pub school_name: String,
    pub literacy: SchoolAggregate,
    pub numeracy: SchoolAggregate,
}

impl SchoolReport {
    pub fn domain(&self, domain: Domain) -> &SchoolAggregate {
        match domain {
            Domain::Literacy => &self.literacy,
            Domain::Numeracy => &self.numeracy,
        }
    }
}

/// Summary entry for the school index listing.
#[derive(Debug, Serialize)]
pub struct SchoolIndexEntry {
    pub school_name: String,
    pub total_learners: usize,
    pub literacy_meets_or_above_percent: f64,
    pub numeracy_meets_or_above_percent: f64,
}

/// Top-level index of all aggregated schools, written as `aggregates.json`.
#[derive(Debug, Serialize)]
pub struct SchoolIndex {
    pub generated_at: DateTime<Utc>,
    pub schools: Vec<SchoolIndexEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cells_read_as_zero() {
        let mut table = GradeBandTable::default();
        table.record("Grade 1", Band::Meets);
        table.record("Grade 1", Band::Meets);
        table.record("Grade 2", Band::Below);

        assert_eq!(table.count("Grade 1", Band::Meets), 2);
        assert_eq!(table.count("Grade 1", Band::Above), 0);
        assert_eq!(table.count("Grade 7", Band::Below), 0);
        assert_eq!(table.total(), 3);
        assert_eq!(table.max_count(), 2);
        assert_eq!(table.max_grade_total(), 2);
    }

    #[test]
    fn test_blank_grade_has_no_row() {
        let mut table = GradeBandTable::default();
        table.record("", Band::Meets);
        table.record("  ", Band::Below);
        table.record(" Grade 1 ", Band::Above);

        let grades: Vec<_> = table.grades().collect();
        assert_eq!(grades, ["Grade 1"]);
        assert_eq!(table.total(), 1);
    }

    #[test]
    fn test_grades_iterate_in_label_order() {
        let mut table = GradeBandTable::default();
        table.record("Grade 3", Band::Above);
        table.record("Grade 1", Band::Above);
        table.record("Grade 2", Band::Above);

        let grades: Vec<_> = table.grades().collect();
        assert_eq!(grades, ["Grade 1", "Grade 2", "Grade 3"]);
    }

    #[test]
    fn test_table_serializes_every_band() {
        let mut table = GradeBandTable::default();
        table.record("R", Band::Approaching);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["R"]["Approaching Expectations"], 1);
        assert_eq!(json["R"]["Above Expectations"], 0);
    }
}
