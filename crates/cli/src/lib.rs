//! CLI for Benchwatch.
//!
//! This crate provides the command-line interface for Benchwatch: the
//! `ingest` and `check` subcommands that run one ingestion cycle against a
//! history artifact, and `show` for inspecting what an artifact holds.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use benchwatch_core::analyze::{Classification, CompareMode};
use benchwatch_core::batch::RawBatch;
use benchwatch_core::model::Run;
use benchwatch_store::{artifact, report, run_cycle, CycleConfig, CycleOutcome};

use config::FileConfig;

/// Benchwatch CLI.
#[derive(Parser, Debug)]
#[command(name = "benchwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by the ingestion-shaped subcommands.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Measurement batch JSON file produced by the harness wrapper.
    #[arg(long)]
    pub batch: PathBuf,

    /// Path of the history artifact.
    #[arg(long, default_value = "dev/bench/data.js")]
    pub artifact: PathBuf,

    /// TOML file providing the settings below; flags win over file values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comparator direction: lower-is-better or higher-is-better.
    #[arg(long)]
    pub mode: Option<CompareMode>,

    /// Fractional noise tolerance, e.g. 0.02 for 2%.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Fractional regression alert threshold, never below the tolerance.
    #[arg(long)]
    pub alert_threshold: Option<f64>,

    /// Global identifier used in the artifact assignment.
    #[arg(long)]
    pub global_ident: Option<String>,

    /// Repository origin recorded in the artifact.
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Write the markdown report for this cycle to the given path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit with status 1 when a regression alert fires.
    #[arg(long)]
    pub fail_on_alert: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge a measurement batch into the history and report regressions.
    Ingest {
        /// Ingestion arguments.
        #[command(flatten)]
        args: IngestArgs,

        /// Classify only; leave the artifact untouched.
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a batch against the history without persisting anything.
    Check {
        /// Ingestion arguments.
        #[command(flatten)]
        args: IngestArgs,
    },

    /// Summarize the series stored in an artifact.
    Show {
        /// Path of the history artifact.
        #[arg(long, default_value = "dev/bench/data.js")]
        artifact: PathBuf,

        /// Global identifier used in the artifact assignment.
        #[arg(long, default_value = artifact::DEFAULT_GLOBAL)]
        global_ident: String,

        /// Limit output to one tool.
        #[arg(long)]
        tool: Option<String>,
    },
}

/// Run the CLI with the process arguments.
pub fn run() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest { args, dry_run } => ingest(args, dry_run),
        Commands::Check { args } => ingest(args, true),
        Commands::Show {
            artifact,
            global_ident,
            tool,
        } => show(&artifact, &global_ident, tool.as_deref()),
    }
}

fn ingest(args: IngestArgs, dry_run: bool) -> anyhow::Result<()> {
    let file_cfg = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let text = fs::read_to_string(&args.batch)
        .with_context(|| format!("reading batch file {}", args.batch.display()))?;
    let batch: RawBatch = serde_json::from_str(&text)
        .with_context(|| format!("parsing batch file {}", args.batch.display()))?;

    let cycle = CycleConfig {
        artifact: args.artifact.clone(),
        global_ident: args
            .global_ident
            .clone()
            .or_else(|| file_cfg.global_ident.clone())
            .unwrap_or_else(|| artifact::DEFAULT_GLOBAL.to_string()),
        analyzer: file_cfg.analyzer(args.mode, args.threshold, args.alert_threshold),
        repo_url: args.repo_url.clone().or_else(|| file_cfg.repo_url.clone()),
        dry_run,
    };

    let outcome = run_cycle(&cycle, batch)?;
    print_summary(&outcome, dry_run);

    if let Some(path) = &args.report {
        fs::write(path, report::render_cycle_report(&outcome))
            .with_context(|| format!("writing report {}", path.display()))?;
        info!(report = %path.display(), "report written");
    }

    if args.fail_on_alert && outcome.has_regression() {
        eprintln!("{}", "regression alerts fired, failing the run".red().bold());
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(outcome: &CycleOutcome, dry_run: bool) {
    let verb = if dry_run { "Checked" } else { "Ingested" };
    let short: String = outcome.commit.id.chars().take(7).collect();
    println!(
        "{verb} `{}` at commit {short}: {} run(s) in series",
        outcome.tool, outcome.runs_in_series
    );

    for alert in &outcome.alerts {
        let status = match alert.classification {
            Classification::Regression => "regression".red().bold(),
            Classification::Warning => "warning".yellow().bold(),
            Classification::Improvement => "improvement".green(),
            other => other.to_string().normal(),
        };
        println!(
            "  {status} {}: {} -> {} {} ({:+.2}%)",
            alert.benchmark,
            alert.baseline,
            alert.current,
            alert.unit,
            alert.delta * 100.0
        );
    }
    for name in &outcome.new_benchmarks {
        println!("  {} {name}", "new".blue());
    }
    if outcome.alerts.is_empty() && outcome.new_benchmarks.is_empty() {
        println!("  all benchmarks within tolerance");
    }
}

fn show(artifact_path: &Path, global_ident: &str, tool: Option<&str>) -> anyhow::Result<()> {
    let history = artifact::load(artifact_path, global_ident)?;
    if history.is_empty() {
        println!("No history at {}", artifact_path.display());
        return Ok(());
    }

    println!("Repository: {}", history.repo_url);
    println!("Last update: {}", format_ms(history.last_update));

    match tool {
        Some(name) => print_series(name, history.series(name)?),
        None => {
            for name in history.tools() {
                print_series(name, history.series(name)?);
            }
        }
    }
    Ok(())
}

fn print_series(name: &str, series: &[Run]) {
    println!();
    let span = match (series.first(), series.last()) {
        (Some(first), Some(last)) => format!("{} .. {}", format_ms(first.date), format_ms(last.date)),
        _ => "empty".to_string(),
    };
    println!("{}: {} run(s), {span}", name.bold(), series.len());
    if let Some(latest) = series.last() {
        for bench in &latest.benches {
            println!("  {}: {} {} ({})", bench.name, bench.value, bench.unit, bench.range);
        }
    }
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}
