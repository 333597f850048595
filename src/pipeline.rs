//! Batch stages over whole directories.
//!
//! Each stage walks its input directory in path order and handles one file at
//! a time. A failure on one file is logged and recorded in the stage's
//! [`StageReport`]; the stage then moves on to the next file. Stages run
//! strictly one after another, so every artifact a stage reads was completely
//! written by an earlier one.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::analyzers::aggregate::{aggregate_school, index_entry};
use crate::analyzers::types::{SchoolIndex, SchoolReport};
use crate::config::{ChartLayout, PipelineConfig, school_name};
use crate::learner::SummaryRow;
use crate::output::{read_summary, write_json, write_summary};
use crate::parser::parse_school_file;
use crate::report::chart::{render_combined_chart, render_domain_chart};
use crate::report::document::{ChartImage, build_document, write_document};
use crate::schema::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summaries,
    Charts,
    Reports,
    Aggregates,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Summaries => "summaries",
            Stage::Charts => "charts",
            Stage::Reports => "reports",
            Stage::Aggregates => "aggregates",
        })
    }
}

/// Result of handling one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Succeeded {
        source: PathBuf,
        outputs: Vec<PathBuf>,
    },
    Failed {
        source: PathBuf,
        reason: String,
    },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Succeeded { .. })
    }

    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Succeeded { source, .. } | FileOutcome::Failed { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcomes: Vec<FileOutcome>,
}

impl StageReport {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            outcomes: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Runs `work` on `source` and records the outcome, logging either way.
    fn record(&mut self, source: &Path, work: impl FnOnce() -> Result<Vec<PathBuf>>) {
        match work() {
            Ok(outputs) => {
                for output in &outputs {
                    info!(stage = %self.stage, file = %source.display(), output = %output.display(), "Saved");
                }
                self.outcomes.push(FileOutcome::Succeeded {
                    source: source.to_path_buf(),
                    outputs,
                });
            }
            Err(e) => {
                error!(stage = %self.stage, file = %source.display(), error = %format!("{e:#}"), "Failed to process file");
                self.outcomes.push(FileOutcome::Failed {
                    source: source.to_path_buf(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    pub fn log_summary(&self) {
        info!(
            stage = %self.stage,
            processed = self.outcomes.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            "Stage complete"
        );
    }
}

/// Lists `*.csv` files directly inside `dir`, sorted by path. A missing
/// directory lists as empty.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Lists the inputs of a stage, emitting the single "nothing to do" line when
/// there are none.
fn stage_inputs(stage: Stage, dir: &Path) -> Result<Vec<PathBuf>> {
    let files = list_csv_files(dir)?;
    if files.is_empty() {
        warn!(%stage, dir = %dir.display(), "No CSV files found");
    }
    Ok(files)
}

/// Stage 1: turns every raw export into a `<stem>_summary.csv`.
#[tracing::instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub fn build_summaries(config: &PipelineConfig) -> Result<StageReport> {
    config.ensure_output_dirs()?;
    let mut report = StageReport::new(Stage::Summaries);

    for file in stage_inputs(Stage::Summaries, &config.data_dir)? {
        report.record(&file, || summarize_file(config, &file));
    }

    report.log_summary();
    Ok(report)
}

fn summarize_file(config: &PipelineConfig, file: &Path) -> Result<Vec<PathBuf>> {
    let learners = parse_school_file(file)?;
    let rows: Vec<SummaryRow> = learners.iter().map(SummaryRow::from).collect();

    let out = config.summary_path(file);
    write_summary(&out, &rows)?;
    Ok(vec![out])
}

/// Reads a summary and aggregates both domains.
fn load_school(file: &Path) -> Result<SchoolReport> {
    let rows = read_summary(file)?;
    Ok(aggregate_school(&school_name(file), &rows))
}

/// Stage 2: renders charts for every summary.
#[tracing::instrument(skip_all, fields(summary_dir = %config.summary_dir.display(), layout = ?config.chart_layout))]
pub fn render_charts(config: &PipelineConfig) -> Result<StageReport> {
    config.ensure_output_dirs()?;
    let mut report = StageReport::new(Stage::Charts);

    for file in stage_inputs(Stage::Charts, &config.summary_dir)? {
        report.record(&file, || chart_school(config, &file));
    }

    report.log_summary();
    Ok(report)
}

fn chart_school(config: &PipelineConfig, file: &Path) -> Result<Vec<PathBuf>> {
    let school = load_school(file)?;

    match config.chart_layout {
        ChartLayout::Separate => {
            let mut outputs = Vec::new();
            for domain in Domain::ALL {
                let out = config.domain_chart_path(&school.school_name, domain);
                let rendered = render_domain_chart(&out, domain, &school.domain(domain).by_grade);
                outputs.push(out);
                if let Err(e) = rendered {
                    discard_charts(&outputs);
                    return Err(e);
                }
            }
            Ok(outputs)
        }
        ChartLayout::Combined => {
            let out = config.combined_chart_path(&school.school_name);
            render_combined_chart(&out, &school.literacy.by_grade, &school.numeracy.by_grade)
                .inspect_err(|_| discard_charts(std::slice::from_ref(&out)))?;
            Ok(vec![out])
        }
    }
}

/// Removes the charts of a school whose rendering failed part-way, so the
/// report stage sees either every chart of the school or none.
fn discard_charts(paths: &[PathBuf]) {
    for path in paths.iter().filter(|p| p.is_file()) {
        match fs::remove_file(path) {
            Ok(()) => warn!(file = %path.display(), "Removed partial chart"),
            Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove partial chart"),
        }
    }
}

/// Stage 3: writes a `.docx` report for every summary, embedding any per-domain
/// chart already on disk.
#[tracing::instrument(skip_all, fields(summary_dir = %config.summary_dir.display()))]
pub fn build_reports(config: &PipelineConfig) -> Result<StageReport> {
    config.ensure_output_dirs()?;
    let mut report = StageReport::new(Stage::Reports);

    for file in stage_inputs(Stage::Reports, &config.summary_dir)? {
        report.record(&file, || report_school(config, &file));
    }

    report.log_summary();
    Ok(report)
}

fn report_school(config: &PipelineConfig, file: &Path) -> Result<Vec<PathBuf>> {
    let school = load_school(file)?;

    let mut charts = Vec::new();
    for domain in Domain::ALL {
        let chart = ChartImage::load(&config.domain_chart_path(&school.school_name, domain))?;
        charts.push((domain, chart));
    }

    let doc = build_document(&school, |domain| {
        charts
            .iter_mut()
            .find(|(d, _)| *d == domain)
            .and_then(|(_, chart)| chart.take())
    });

    let out = config.document_path(&school.school_name);
    write_document(&out, doc)?;
    Ok(vec![out])
}

/// Writes `<school>_aggregate.json` for every summary plus an `aggregates.json`
/// index of the schools that aggregated successfully.
#[tracing::instrument(skip_all, fields(summary_dir = %config.summary_dir.display()))]
pub fn write_aggregates(config: &PipelineConfig) -> Result<StageReport> {
    config.ensure_output_dirs()?;
    let mut report = StageReport::new(Stage::Aggregates);
    let mut entries = Vec::new();

    let files = stage_inputs(Stage::Aggregates, &config.summary_dir)?;
    if files.is_empty() {
        report.log_summary();
        return Ok(report);
    }

    for file in files {
        report.record(&file, || {
            let school = load_school(&file)?;
            let out = config.aggregate_path(&school.school_name);
            write_json(&out, &school)?;
            entries.push(index_entry(&school));
            Ok(vec![out])
        });
    }

    let index = SchoolIndex {
        generated_at: Utc::now(),
        schools: entries,
    };
    write_json(&config.index_path(), &index)?;
    info!(schools = index.schools.len(), path = %config.index_path().display(), "Wrote aggregate index");

    report.log_summary();
    Ok(report)
}

/// Runs summaries, then charts, then reports.
pub fn run_all(config: &PipelineConfig) -> Result<Vec<StageReport>> {
    Ok(vec![
        build_summaries(config)?,
        render_charts(config)?,
        build_reports(config)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink shared between a test and the subscriber it installs.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn write_hillside_summary(config: &PipelineConfig) {
        config.ensure_output_dirs().unwrap();
        fs::write(
            config.summary_dir.join("Hillside_summary.csv"),
            "Name,Grade,Gender,Literacy Level,Numeracy Level\n\
             Ayo,Grade 1,Male,Paragraph,Count\n\
             Bea,Grade 1,Female,Unspecified,Division\n",
        )
        .unwrap();
    }

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: root.join("data"),
            summary_dir: root.join("summary"),
            report_dir: root.join("reports-docs"),
            chart_layout: ChartLayout::Separate,
        }
    }

    #[test]
    fn test_list_csv_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.csv", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = list_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.csv", "b.csv"]);
    }

    #[test]
    fn test_missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_csv_files(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_bad_file_is_recorded_and_skipped() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        fs::create_dir_all(&config.data_dir).unwrap();
        fs::write(config.data_dir.join("broken.csv"), "Index,No,Name\n1,2,3\n").unwrap();

        let report = build_summaries(&config).unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 0);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.source(), config.data_dir.join("broken.csv"));
        match outcome {
            FileOutcome::Failed { reason, .. } => assert!(reason.contains("header has 3 columns")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!config.summary_dir.join("broken_summary.csv").exists());
    }

    #[test]
    fn test_empty_summary_dir_produces_nothing() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());

        let charts = render_charts(&config).unwrap();
        let reports = build_reports(&config).unwrap();
        let aggregates = write_aggregates(&config).unwrap();

        assert!(charts.outcomes.is_empty());
        assert!(reports.outcomes.is_empty());
        assert!(aggregates.outcomes.is_empty());
        assert_eq!(fs::read_dir(&config.report_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_summary_dir_logs_one_warning() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let report = tracing::subscriber::with_default(subscriber, || render_charts(&config));
        let report = report.unwrap();

        assert!(report.outcomes.is_empty());
        let output = logs.contents();
        assert_eq!(output.lines().count(), 1, "{output}");
        assert_eq!(output.matches("No CSV files found").count(), 1);
        assert!(output.contains("WARN"));
    }

    #[test]
    fn test_failed_domain_chart_leaves_no_charts_behind() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        write_hillside_summary(&config);
        // a directory where the numeracy image should go makes that render fail
        fs::create_dir_all(config.domain_chart_path("Hillside", Domain::Numeracy)).unwrap();

        let report = render_charts(&config).unwrap();

        assert_eq!(report.failed(), 1);
        assert!(!config.domain_chart_path("Hillside", Domain::Literacy).exists());

        fs::remove_dir(config.domain_chart_path("Hillside", Domain::Numeracy)).unwrap();
        let reports = build_reports(&config).unwrap();
        assert_eq!(reports.succeeded(), 1);
        let docx = fs::read(config.document_path("Hillside")).unwrap();
        assert!(!docx.windows(11).any(|w| w == b"word/media/"));
    }

    #[test]
    fn test_reports_without_charts() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        write_hillside_summary(&config);

        let report = build_reports(&config).unwrap();

        assert_eq!(report.succeeded(), 1);
        assert!(config.document_path("Hillside").exists());
    }

    #[test]
    fn test_aggregates_write_school_json_and_index() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        write_hillside_summary(&config);
        fs::write(config.summary_dir.join("Broken_summary.csv"), "Name,Grade\nAyo,1\n").unwrap();

        let report = write_aggregates(&config).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let school: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.aggregate_path("Hillside")).unwrap())
                .unwrap();
        assert_eq!(school["literacy"]["total_learners"], 2);
        assert_eq!(school["literacy"]["unspecified"], 1);
        assert_eq!(school["literacy"]["by_grade"]["Grade 1"]["Meets Expectations"], 1);

        let index: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.index_path()).unwrap()).unwrap();
        assert_eq!(index["schools"].as_array().unwrap().len(), 1);
        assert_eq!(index["schools"][0]["school_name"], "Hillside");
    }
}
