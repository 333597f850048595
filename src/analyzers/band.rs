use serde::{Deserialize, Serialize};

use crate::schema::Domain;

/// Expectation band a level falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "Below Expectations")]
    Below,
    #[serde(rename = "Approaching Expectations")]
    Approaching,
    #[serde(rename = "Meets Expectations")]
    Meets,
    #[serde(rename = "Above Expectations")]
    Above,
}

impl Band {
    /// Declaration order; counts, charts and summaries iterate bands this way.
    pub const ALL: [Band; 4] = [Band::Below, Band::Approaching, Band::Meets, Band::Above];

    /// Column order of the per-grade breakdown table in reports.
    pub const BREAKDOWN_COLUMNS: [Band; 4] =
        [Band::Above, Band::Approaching, Band::Below, Band::Meets];

    pub fn label(self) -> &'static str {
        match self {
            Band::Below => "Below Expectations",
            Band::Approaching => "Approaching Expectations",
            Band::Meets => "Meets Expectations",
            Band::Above => "Above Expectations",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

static LITERACY_BANDS: &[(Band, &[&str])] = &[
    (Band::Below, &["Beginner (Lit)"]),
    (Band::Approaching, &["Letter", "Word"]),
    (Band::Meets, &["Paragraph"]),
    (Band::Above, &["Story", "Above (Lit)"]),
];

static NUMERACY_BANDS: &[(Band, &[&str])] = &[
    (Band::Below, &["Beginner (Num)", "Count"]),
    (Band::Approaching, &["Number Rec.", "Addition"]),
    (Band::Meets, &["Subtraction", "Multiplication"]),
    (Band::Above, &["Division", "Above (Num)"]),
];

/// Level-to-band lookup table of a domain.
pub fn band_table(domain: Domain) -> &'static [(Band, &'static [&'static str])] {
    match domain {
        Domain::Literacy => LITERACY_BANDS,
        Domain::Numeracy => NUMERACY_BANDS,
    }
}

/// Returns the band containing `level`, or `None` for "Unspecified" and any
/// label outside the domain's vocabulary.
pub fn classify(domain: Domain, level: &str) -> Option<Band> {
    band_table(domain)
        .iter()
        .find(|(_, levels)| levels.contains(&level))
        .map(|(band, _)| *band)
}
