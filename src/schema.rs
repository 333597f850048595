//! Fixed column layout of a raw school export and the level vocabularies of
//! both assessment domains.

use serde::{Deserialize, Serialize};

/// Label used when no indicator of a domain is set.
pub const UNSPECIFIED: &str = "Unspecified";

/// Number of metadata records that follow the header line of a raw export.
pub const METADATA_ROWS: usize = 3;

/// Column names of a raw export, in file order.
pub static RAW_COLUMNS: [&str; 20] = [
    "Index",
    "No",
    "Name",
    "Grade",
    "Gender",
    "Beginner (Lit)",
    "Letter",
    "Word",
    "Paragraph",
    "Story",
    "Above (Lit)",
    "Beginner (Num)",
    "Count",
    "Number Rec.",
    "Addition",
    "Subtraction",
    "Multiplication",
    "Division",
    "Above (Num)",
    "Extra",
];

pub const NAME_COLUMN: usize = 2;
pub const GRADE_COLUMN: usize = 3;
pub const GENDER_COLUMN: usize = 4;

/// Position of the first indicator column in a raw row.
pub const FIRST_INDICATOR_COLUMN: usize = 5;

pub const INDICATOR_COUNT: usize = LITERACY_LEVELS.len() + NUMERACY_LEVELS.len();

/// Literacy levels, lowest first. Also the order the extractor scans them in.
pub const LITERACY_LEVELS: [&str; 6] = [
    "Beginner (Lit)",
    "Letter",
    "Word",
    "Paragraph",
    "Story",
    "Above (Lit)",
];

/// Numeracy levels, lowest first.
pub const NUMERACY_LEVELS: [&str; 8] = [
    "Beginner (Num)",
    "Count",
    "Number Rec.",
    "Addition",
    "Subtraction",
    "Multiplication",
    "Division",
    "Above (Num)",
];

/// One of the two parallel assessment tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Literacy,
    Numeracy,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Literacy, Domain::Numeracy];

    /// Ordered level vocabulary of the domain.
    pub fn levels(self) -> &'static [&'static str] {
        match self {
            Domain::Literacy => &LITERACY_LEVELS,
            Domain::Numeracy => &NUMERACY_LEVELS,
        }
    }

    /// Offset of the domain's first indicator within the indicator block.
    pub fn indicator_offset(self) -> usize {
        match self {
            Domain::Literacy => 0,
            Domain::Numeracy => LITERACY_LEVELS.len(),
        }
    }

    /// Lowercase name used in artifact file names.
    pub fn slug(self) -> &'static str {
        match self {
            Domain::Literacy => "literacy",
            Domain::Numeracy => "numeracy",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Domain::Literacy => "Literacy",
            Domain::Numeracy => "Numeracy",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_block_matches_vocabularies() {
        let block = &RAW_COLUMNS[FIRST_INDICATOR_COLUMN..FIRST_INDICATOR_COLUMN + INDICATOR_COUNT];
        for domain in Domain::ALL {
            let offset = domain.indicator_offset();
            let levels = domain.levels();
            assert_eq!(&block[offset..offset + levels.len()], levels);
        }
        assert_eq!(RAW_COLUMNS[RAW_COLUMNS.len() - 1], "Extra");
    }

    #[test]
    fn vocabularies_do_not_contain_unspecified() {
        assert!(!LITERACY_LEVELS.contains(&UNSPECIFIED));
        assert!(!NUMERACY_LEVELS.contains(&UNSPECIFIED));
    }
}
