//! Directory layout and rendering options for a pipeline run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::schema::Domain;

/// How charts are laid out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ChartLayout {
    /// One grouped-bar image per domain.
    #[default]
    Separate,
    /// A single image with a stacked-bar panel per domain.
    Combined,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Raw school exports.
    pub data_dir: PathBuf,
    /// Per-learner summaries, written by the first stage.
    pub summary_dir: PathBuf,
    /// Charts, documents and JSON aggregates.
    pub report_dir: PathBuf,
    pub chart_layout: ChartLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            summary_dir: PathBuf::from("summary"),
            report_dir: PathBuf::from("reports-docs"),
            chart_layout: ChartLayout::default(),
        }
    }
}

const SUMMARY_SUFFIX: &str = "_summary.csv";

impl PipelineConfig {
    pub fn with_layout(mut self, layout: ChartLayout) -> Self {
        self.chart_layout = layout;
        self
    }

    /// Creates the output directories if they do not exist.
    pub fn ensure_output_dirs(&self) -> Result<()> {
        for dir in [&self.summary_dir, &self.report_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// Summary path for a raw export: `<summary_dir>/<stem>_summary.csv`.
    pub fn summary_path(&self, raw_file: &Path) -> PathBuf {
        let stem = raw_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.summary_dir.join(format!("{stem}{SUMMARY_SUFFIX}"))
    }

    pub fn domain_chart_path(&self, school: &str, domain: Domain) -> PathBuf {
        self.report_dir
            .join(format!("{school}_{}_graph.png", domain.slug()))
    }

    pub fn combined_chart_path(&self, school: &str) -> PathBuf {
        self.report_dir.join(format!("{school}_graph.png"))
    }

    pub fn document_path(&self, school: &str) -> PathBuf {
        self.report_dir.join(format!("{school}_report.docx"))
    }

    pub fn aggregate_path(&self, school: &str) -> PathBuf {
        self.report_dir.join(format!("{school}_aggregate.json"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.report_dir.join("aggregates.json")
    }
}

/// School identity of a summary file: its name without `_summary.csv`.
pub fn school_name(summary_file: &Path) -> String {
    let file_name = summary_file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(SUMMARY_SUFFIX) {
        Some(school) => school.to_string(),
        None => summary_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let config = PipelineConfig::default();

        assert_eq!(
            config.summary_path(Path::new("data/Hillside Primary.csv")),
            Path::new("summary/Hillside Primary_summary.csv")
        );
        assert_eq!(
            config.domain_chart_path("Hillside", Domain::Literacy),
            Path::new("reports-docs/Hillside_literacy_graph.png")
        );
        assert_eq!(
            config.domain_chart_path("Hillside", Domain::Numeracy),
            Path::new("reports-docs/Hillside_numeracy_graph.png")
        );
        assert_eq!(
            config.combined_chart_path("Hillside"),
            Path::new("reports-docs/Hillside_graph.png")
        );
        assert_eq!(
            config.document_path("Hillside"),
            Path::new("reports-docs/Hillside_report.docx")
        );
    }

    #[test]
    fn test_school_name_strips_summary_suffix() {
        assert_eq!(school_name(Path::new("summary/Hillside_summary.csv")), "Hillside");
        assert_eq!(school_name(Path::new("summary/Other.csv")), "Other");
    }

    #[test]
    fn test_ensure_output_dirs_creates_missing() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: root.path().join("data"),
            summary_dir: root.path().join("out/summary"),
            report_dir: root.path().join("out/reports"),
            chart_layout: ChartLayout::Separate,
        };

        config.ensure_output_dirs().unwrap();

        assert!(config.summary_dir.is_dir());
        assert!(config.report_dir.is_dir());
    }
}
