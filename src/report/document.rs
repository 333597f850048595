//! DOCX school reports.
//!
//! A report holds one section per domain, literacy first, separated by a page
//! break. Section text is assembled into a [`DomainSection`] before layout so
//! the wording can be checked without opening the document.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, bail};
use docx_rs::{
    BreakType, Docx, Paragraph, Pic, Run, Style, StyleType, Table, TableCell, TableRow,
};
use image::{ImageFormat, ImageReader};
use tracing::{debug, warn};

use crate::analyzers::band::Band;
use crate::analyzers::types::{SchoolAggregate, SchoolReport};
use crate::schema::Domain;

/// Rendered chart width in the document: 6 inches in EMU.
const CHART_WIDTH_EMU: u32 = 6 * 914_400;

const HEADING_STYLE: &str = "Heading1";

static LITERACY_RECOMMENDATIONS: [&str; 3] = [
    "Implement remedial reading sessions.",
    "Encourage home reading activities.",
    "Provide advanced reading materials for strong readers.",
];

static NUMERACY_RECOMMENDATIONS: [&str; 3] = [
    "Implement remedial numeracy sessions.",
    "Use hands-on activities to improve number sense.",
    "Provide advanced problem-solving exercises.",
];

/// Text content of one domain's section.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSection {
    pub heading: &'static str,
    pub school_line: String,
    pub total_line: String,
    pub summary_title: &'static str,
    /// Category, count, percentage; one row per band in declaration order.
    pub summary_rows: Vec<[String; 3]>,
    pub insights: Vec<String>,
    pub recommendations: &'static [&'static str],
    pub chart_caption: String,
    /// Grade followed by the counts of [`Band::BREAKDOWN_COLUMNS`].
    pub breakdown_rows: Vec<[String; 5]>,
}

pub fn domain_section(aggregate: &SchoolAggregate) -> DomainSection {
    let domain = aggregate.domain;
    let (heading, summary_title, recommendations) = match domain {
        Domain::Literacy => (
            "SCHOOL BASELINE READING PERFORMANCE REPORT",
            "Reading Performance Summary",
            &LITERACY_RECOMMENDATIONS,
        ),
        Domain::Numeracy => (
            "SCHOOL BASELINE NUMERACY PERFORMANCE REPORT",
            "Numeracy Performance Summary",
            &NUMERACY_RECOMMENDATIONS,
        ),
    };

    let summary_rows = aggregate
        .bands
        .iter()
        .map(|t| {
            [
                t.band.label().to_string(),
                t.count.to_string(),
                format_percent(t.percentage),
            ]
        })
        .collect();

    let insights = aggregate
        .bands
        .iter()
        .map(|t| {
            format!(
                "- {} of learners are in the {} category.",
                format_percent(t.percentage),
                t.band
            )
        })
        .collect();

    let breakdown_rows = aggregate
        .by_grade
        .rows()
        .map(|(grade, counts)| {
            let [a, b, c, d] = Band::BREAKDOWN_COLUMNS.map(|band| counts.get(band).to_string());
            [grade.to_string(), a, b, c, d]
        })
        .collect();

    DomainSection {
        heading,
        school_line: format!("School Name: {}", aggregate.school_name),
        total_line: format!("Total Learners Assessed: {}", aggregate.total_learners),
        summary_title,
        summary_rows,
        insights,
        recommendations,
        chart_caption: format!("{domain} Performance Summary Graph"),
        breakdown_rows,
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// PNG chart bytes with their pixel size.
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl ChartImage {
    /// Loads a chart from disk. A missing file is not an error; a file that is
    /// not a PNG is skipped with a warning.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "No chart image, section omitted");
            return Ok(None);
        }

        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        match png_dimensions(&bytes) {
            Ok((width_px, height_px)) => Ok(Some(ChartImage {
                bytes,
                width_px,
                height_px,
            })),
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "Chart is not a usable PNG, section omitted");
                Ok(None)
            }
        }
    }

    fn to_pic(&self) -> Pic {
        let height_emu =
            (CHART_WIDTH_EMU as u64 * self.height_px as u64 / self.width_px.max(1) as u64) as u32;
        Pic::new_with_dimensions(self.bytes.clone(), self.width_px, self.height_px)
            .size(CHART_WIDTH_EMU, height_emu)
    }
}

/// Reads the pixel size of a PNG without decoding its image data.
pub fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format() != Some(ImageFormat::Png) {
        bail!("not a PNG image");
    }
    let (width, height) = reader.into_dimensions()?;
    if width == 0 || height == 0 {
        bail!("empty image {width}x{height}");
    }
    Ok((width, height))
}

/// Lays out a school's report. `chart_for` supplies each domain's chart, if any.
pub fn build_document(
    report: &SchoolReport,
    mut chart_for: impl FnMut(Domain) -> Option<ChartImage>,
) -> Docx {
    let mut doc = Docx::new().add_style(
        Style::new(HEADING_STYLE, StyleType::Paragraph)
            .name("Heading 1")
            .size(32)
            .bold(),
    );

    for (i, domain) in Domain::ALL.into_iter().enumerate() {
        if i > 0 {
            doc = doc.add_paragraph(page_break());
        }
        let section = domain_section(report.domain(domain));
        doc = add_section(doc, &section, chart_for(domain).as_ref());
    }

    doc
}

fn add_section(mut doc: Docx, section: &DomainSection, chart: Option<&ChartImage>) -> Docx {
    doc = doc
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(section.heading))
                .style(HEADING_STYLE),
        )
        .add_paragraph(text(&section.school_line))
        .add_paragraph(text(&section.total_line))
        .add_paragraph(bold(section.summary_title));

    let header = ["Category", "Number of Learners", "Percentage of Total"];
    doc = doc.add_table(table(&header, &section.summary_rows));

    doc = doc.add_paragraph(bold("Key Insights & Interpretation"));
    for line in &section.insights {
        doc = doc.add_paragraph(text(line));
    }

    doc = doc.add_paragraph(bold("Recommendations for Improvement"));
    for line in section.recommendations {
        doc = doc.add_paragraph(text(&format!("- {line}")));
    }

    if let Some(chart) = chart {
        doc = doc
            .add_paragraph(page_break())
            .add_paragraph(text(&section.chart_caption))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_image(chart.to_pic())));
    }

    let mut breakdown_header = vec!["Grade"];
    breakdown_header.extend(Band::BREAKDOWN_COLUMNS.iter().map(|b| b.label()));
    doc.add_table(table(&breakdown_header, &section.breakdown_rows))
}

fn text(content: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(content))
}

fn bold(content: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(content).bold())
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

fn cell(content: &str) -> TableCell {
    TableCell::new().add_paragraph(text(content))
}

fn table<const N: usize>(header: &[&str], rows: &[[String; N]]) -> Table {
    let mut table_rows = vec![TableRow::new(header.iter().map(|h| cell(h)).collect())];
    for row in rows {
        table_rows.push(TableRow::new(row.iter().map(|c| cell(c)).collect()));
    }
    Table::new(table_rows)
}

/// Writes a report to `path` as a `.docx` package.
pub fn write_document(path: &Path, doc: Docx) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    doc.build()
        .pack(file)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
