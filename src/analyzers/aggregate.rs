use crate::analyzers::band::{Band, classify};
use crate::analyzers::types::{
    BandCounts, BandTally, GradeBandTable, SchoolAggregate, SchoolIndexEntry, SchoolReport,
};
use crate::analyzers::utility::{pct, round2};
use crate::learner::SummaryRow;
use crate::schema::Domain;

/// Aggregates the summary rows of one school for one domain.
///
/// Every row counts towards `total_learners`. Rows whose level maps to no band
/// are left out of the band counts and the grade table, so percentages only
/// sum to 100 when every learner has a level in this domain. Banded rows with a
/// blank grade count towards their band but have no grade table row.
pub fn aggregate_domain(school_name: &str, domain: Domain, rows: &[SummaryRow]) -> SchoolAggregate {
    let total_learners = rows.len();
    let mut counts = BandCounts::default();
    let mut by_grade = GradeBandTable::default();
    let mut unspecified = 0;

    for row in rows {
        match classify(domain, row.level(domain)) {
            Some(band) => {
                counts.increment(band);
                by_grade.record(&row.grade, band);
            }
            None => unspecified += 1,
        }
    }

    let bands = Band::ALL
        .iter()
        .map(|&band| {
            let count = counts.get(band);
            BandTally {
                band,
                count,
                percentage: round2(pct(count, total_learners)),
            }
        })
        .collect();

    SchoolAggregate {
        school_name: school_name.to_string(),
        domain,
        total_learners,
        unspecified,
        bands,
        by_grade,
    }
}

/// Aggregates both domains of one school.
pub fn aggregate_school(school_name: &str, rows: &[SummaryRow]) -> SchoolReport {
    SchoolReport {
        schema_version: 1,
        school_name: school_name.to_string(),
        literacy: aggregate_domain(school_name, Domain::Literacy, rows),
        numeracy: aggregate_domain(school_name, Domain::Numeracy, rows),
    }
}

/// Builds the index line for a school: its size and the share of learners
/// meeting or exceeding expectations in each domain.
pub fn index_entry(report: &SchoolReport) -> SchoolIndexEntry {
    let on_track = |aggregate: &SchoolAggregate| {
        let count = [Band::Meets, Band::Above]
            .iter()
            .filter_map(|&band| aggregate.tally(band))
            .map(|t| t.count)
            .sum();
        round2(pct(count, aggregate.total_learners))
    };

    SchoolIndexEntry {
        school_name: report.school_name.clone(),
        total_learners: report.literacy.total_learners,
        literacy_meets_or_above_percent: on_track(&report.literacy),
        numeracy_meets_or_above_percent: on_track(&report.numeracy),
    }
}
