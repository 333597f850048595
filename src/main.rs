//! CLI entry point for the baseline assessment reporter.
//!
//! Provides subcommands for summarizing raw school exports, rendering charts,
//! building DOCX reports, and writing JSON aggregates.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use baseline_report::config::{ChartLayout, PipelineConfig};
use baseline_report::pipeline::{
    build_reports, build_summaries, render_charts, run_all, write_aggregates,
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "baseline_report")]
#[command(about = "Summarize school baseline assessments and build reports", long_about = None)]
struct Cli {
    #[command(flatten)]
    dirs: DirArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DirArgs {
    /// Directory containing raw school exports
    #[arg(long, global = true, env = "BASELINE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for per-learner summary CSVs
    #[arg(long, global = true, env = "BASELINE_SUMMARY_DIR", default_value = "summary")]
    summary_dir: PathBuf,

    /// Directory for charts, reports and aggregates
    #[arg(long, global = true, env = "BASELINE_REPORT_DIR", default_value = "reports-docs")]
    report_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a summary CSV for every raw export
    Summarize,
    /// Render performance charts for every summary
    Charts {
        /// Separate image per domain, or one combined image
        #[arg(short, long, value_enum, default_value_t = ChartLayout::Separate)]
        layout: ChartLayout,
    },
    /// Build a DOCX report for every summary
    Reports,
    /// Write per-school JSON aggregates and an index
    Aggregate,
    /// Summarize, chart and report in one go
    Run {
        #[arg(short, long, value_enum, default_value_t = ChartLayout::Separate)]
        layout: ChartLayout,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/baseline_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("baseline_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig {
        data_dir: cli.dirs.data_dir,
        summary_dir: cli.dirs.summary_dir,
        report_dir: cli.dirs.report_dir,
        ..PipelineConfig::default()
    };

    let reports = match cli.command {
        Commands::Summarize => vec![build_summaries(&config)?],
        Commands::Charts { layout } => vec![render_charts(&config.with_layout(layout))?],
        Commands::Reports => vec![build_reports(&config)?],
        Commands::Aggregate => vec![write_aggregates(&config)?],
        Commands::Run { layout } => run_all(&config.with_layout(layout))?,
    };

    let failed: usize = reports.iter().map(|r| r.failed()).sum();
    if failed > 0 {
        warn!(failed, "Some files could not be processed, see errors above");
    } else {
        info!("Done");
    }

    Ok(())
}
