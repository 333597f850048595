//! Bar charts of band counts per grade.

use std::path::Path;

use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::debug;

use crate::analyzers::band::Band;
use crate::analyzers::types::GradeBandTable;
use crate::schema::Domain;

pub const CHART_SIZE: (u32, u32) = (800, 500);
pub const COMBINED_CHART_SIZE: (u32, u32) = (1000, 1200);

/// Greyscale fill per band, darkest for Below.
const BAND_COLORS: [RGBColor; 4] = [
    RGBColor(60, 60, 60),
    RGBColor(110, 110, 110),
    RGBColor(160, 160, 160),
    RGBColor(210, 210, 210),
];

/// Width of the bar cluster (or stacked bar) at each grade, in axis units.
const GROUP_WIDTH: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarMode {
    Grouped,
    Stacked,
}

/// Renders one domain as grouped bars to a PNG at `path`.
pub fn render_domain_chart(path: &Path, domain: Domain, table: &GradeBandTable) -> Result<()> {
    debug!(path = %path.display(), %domain, grades = table.grades().count(), "Rendering chart");

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    draw_panel(&root, domain, table, BarMode::Grouped).map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    Ok(())
}

/// Renders both domains as stacked-bar panels, literacy above numeracy.
pub fn render_combined_chart(
    path: &Path,
    literacy: &GradeBandTable,
    numeracy: &GradeBandTable,
) -> Result<()> {
    debug!(path = %path.display(), "Rendering combined chart");

    let root = BitMapBackend::new(path, COMBINED_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let panels = root.split_evenly((2, 1));
    draw_panel(&panels[0], Domain::Literacy, literacy, BarMode::Stacked).map_err(plot_err)?;
    draw_panel(&panels[1], Domain::Numeracy, numeracy, BarMode::Stacked).map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    Ok(())
}

fn plot_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> anyhow::Error {
    anyhow!("chart rendering failed: {err}")
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    domain: Domain,
    table: &GradeBandTable,
    mode: BarMode,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let grades: Vec<&str> = table.grades().collect();
    // keep a non-empty axis when there is nothing to plot
    let slots = grades.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{domain} Performance by Grade"), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(slots as f64 - 0.5), 0u32..y_axis_max(table, mode))?;

    let label_for = |x: &f64| grade_label(&grades, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots * 2 + 1)
        .x_label_formatter(&label_for)
        .x_desc("Grade")
        .y_desc("Number of Students")
        .draw()?;

    let mut stacked_base = vec![0u32; grades.len()];
    for (i, band) in Band::ALL.iter().enumerate() {
        let color = BAND_COLORS[i];
        let bars: Vec<Rectangle<(f64, u32)>> = grades
            .iter()
            .enumerate()
            .map(|(g, grade)| {
                let count = table.count(grade, *band) as u32;
                match mode {
                    BarMode::Grouped => {
                        let (left, right) = grouped_span(g, i);
                        Rectangle::new([(left, 0), (right, count)], color.filled())
                    }
                    BarMode::Stacked => {
                        let bottom = stacked_base[g];
                        stacked_base[g] += count;
                        let half = GROUP_WIDTH / 2.0;
                        Rectangle::new(
                            [(g as f64 - half, bottom), (g as f64 + half, bottom + count)],
                            color.filled(),
                        )
                    }
                }
            })
            .collect();

        chart
            .draw_series(bars)?
            .label(band.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Horizontal extent of band `band_index`'s bar in the cluster at `slot`.
fn grouped_span(slot: usize, band_index: usize) -> (f64, f64) {
    let bar = GROUP_WIDTH / Band::ALL.len() as f64;
    let left = slot as f64 - GROUP_WIDTH / 2.0 + band_index as f64 * bar;
    (left, left + bar)
}

/// Upper bound of the count axis with some headroom above the tallest bar.
fn y_axis_max(table: &GradeBandTable, mode: BarMode) -> u32 {
    let peak = match mode {
        BarMode::Grouped => table.max_count(),
        BarMode::Stacked => table.max_grade_total(),
    } as u32;
    peak + (peak / 10).max(1)
}

/// Axis label at `x`: the grade name on whole slots, blank elsewhere.
fn grade_label(grades: &[&str], x: f64) -> String {
    let slot = x.round();
    if (x - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    grades
        .get(slot as usize)
        .map(|g| g.to_string())
        .unwrap_or_default()
}
