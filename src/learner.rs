use serde::{Deserialize, Serialize};

use crate::schema::{Domain, INDICATOR_COUNT, UNSPECIFIED};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl Gender {
    /// Maps the export's gender codes; anything other than `M`/`F` is unspecified.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "M" => Gender::Male,
            "F" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }
}

/// One learner from a raw school export with both domain levels resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerRecord {
    pub name: String,
    pub grade: String,
    pub gender: Gender,
    pub indicators: [f64; INDICATOR_COUNT],
    pub literacy_level: &'static str,
    pub numeracy_level: &'static str,
}

impl LearnerRecord {
    pub fn from_indicators(
        name: &str,
        grade: &str,
        gender: Gender,
        indicators: [f64; INDICATOR_COUNT],
    ) -> Self {
        LearnerRecord {
            name: name.to_string(),
            grade: grade.to_string(),
            gender,
            literacy_level: extract_level(Domain::Literacy, &indicators),
            numeracy_level: extract_level(Domain::Numeracy, &indicators),
            indicators,
        }
    }
}

/// Returns the first level of `domain` whose indicator equals 1, scanning in
/// declared order, or [`UNSPECIFIED`] when none is set.
pub fn extract_level(domain: Domain, indicators: &[f64; INDICATOR_COUNT]) -> &'static str {
    let offset = domain.indicator_offset();
    domain
        .levels()
        .iter()
        .zip(&indicators[offset..])
        .find(|(_, value)| **value == 1.0)
        .map(|(level, _)| *level)
        .unwrap_or(UNSPECIFIED)
}

/// A row of a `<school>_summary.csv` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Grade")]
    pub grade: String,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Literacy Level")]
    pub literacy_level: String,
    #[serde(rename = "Numeracy Level")]
    pub numeracy_level: String,
}

impl SummaryRow {
    pub fn level(&self, domain: Domain) -> &str {
        match domain {
            Domain::Literacy => &self.literacy_level,
            Domain::Numeracy => &self.numeracy_level,
        }
    }
}

impl From<&LearnerRecord> for SummaryRow {
    fn from(record: &LearnerRecord) -> Self {
        SummaryRow {
            name: record.name.clone(),
            grade: record.grade.clone(),
            gender: record.gender,
            literacy_level: record.literacy_level.to_string(),
            numeracy_level: record.numeracy_level.to_string(),
        }
    }
}
