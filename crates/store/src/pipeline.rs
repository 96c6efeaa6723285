// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! One full ingestion cycle.
//!
//! `load -> validate -> analyze -> merge -> persist`, sequential and
//! single-threaded. Analysis always runs against the series as it existed
//! before the merge, so the incoming run never serves as its own baseline.
//! Every error propagates to the caller; a failed cycle leaves the
//! previously persisted artifact unmodified.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use benchwatch_core::analyze::{analyze_run, Alert, AnalyzerConfig, Classification};
use benchwatch_core::batch::{RawBatch, ValidationError};
use benchwatch_core::model::Commit;

use crate::artifact;
use crate::error::StoreError;

/// Everything one ingestion cycle needs to know.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Path of the persisted artifact.
    pub artifact: PathBuf,
    /// Global identifier used in the artifact assignment.
    pub global_ident: String,
    /// Analyzer tolerances for this invocation.
    pub analyzer: AnalyzerConfig,
    /// Repository origin override. When unset, a bootstrapped store derives
    /// it from the incoming commit URL.
    pub repo_url: Option<String>,
    /// Classify only; skip the persist step entirely.
    pub dry_run: bool,
}

impl CycleConfig {
    /// A cycle against `artifact` with default identifier and tolerances.
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
            global_ident: artifact::DEFAULT_GLOBAL.to_string(),
            analyzer: AnalyzerConfig::default(),
            repo_url: None,
            dry_run: false,
        }
    }
}

/// What one cycle produced, for the caller to surface.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Tool the ingested run belongs to.
    pub tool: String,
    /// Commit the ingested run measured.
    pub commit: Commit,
    /// Capture date of the ingested run.
    pub run_date: i64,
    /// Series length for the tool after the merge.
    pub runs_in_series: usize,
    /// Alerts for benchmarks classified outside tolerance.
    pub alerts: Vec<Alert>,
    /// Benchmark names that had no usable baseline.
    pub new_benchmarks: Vec<String>,
}

impl CycleOutcome {
    /// Whether any alert is a full regression.
    pub fn has_regression(&self) -> bool {
        self.alerts
            .iter()
            .any(|a| a.classification == Classification::Regression)
    }
}

/// Errors surfaced by an ingestion cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The incoming batch was malformed; nothing was loaded or written.
    #[error("invalid measurement batch")]
    Validation(#[from] ValidationError),

    /// The store failed to load, encode or persist.
    #[error("history store failure")]
    Store(#[from] StoreError),
}

/// Run one ingestion cycle for `batch` against the configured artifact.
pub fn run_cycle(
    config: &CycleConfig,
    batch: RawBatch,
) -> std::result::Result<CycleOutcome, PipelineError> {
    let run = batch.into_run()?;
    debug!(tool = %run.tool, benches = run.benches.len(), "validated measurement batch");

    let mut history = artifact::load(&config.artifact, &config.global_ident)?;

    let prior = history
        .entries
        .get(run.tool.as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let analysis = analyze_run(prior, &run, &config.analyzer);

    for alert in &analysis.alerts {
        match alert.classification {
            Classification::Regression => warn!(
                benchmark = %alert.benchmark,
                baseline = alert.baseline,
                current = alert.current,
                delta = alert.delta,
                "regression detected"
            ),
            Classification::Warning => warn!(
                benchmark = %alert.benchmark,
                delta = alert.delta,
                "possible regression"
            ),
            _ => info!(
                benchmark = %alert.benchmark,
                delta = alert.delta,
                classification = %alert.classification,
                "benchmark moved"
            ),
        }
    }

    if let Some(url) = &config.repo_url {
        history.repo_url = url.clone();
    } else if history.repo_url.is_empty() {
        if let Some(url) = repo_url_from_commit(&run.commit.url) {
            history.repo_url = url.to_string();
        }
    }

    let tool = run.tool.clone();
    let commit = run.commit.clone();
    let run_date = run.date;
    let new_benchmarks = analysis.new_benchmarks;
    history.merge(run);
    let runs_in_series = history.series(&tool)?.len();

    if config.dry_run {
        info!(tool = %tool, "dry run, artifact left untouched");
    } else {
        artifact::save(&config.artifact, &history, &config.global_ident)?;
        info!(
            tool = %tool,
            runs = runs_in_series,
            artifact = %config.artifact.display(),
            "history persisted"
        );
    }

    Ok(CycleOutcome {
        tool,
        commit,
        run_date,
        runs_in_series,
        alerts: analysis.alerts,
        new_benchmarks,
    })
}

/// Derive the repository origin from a commit URL of the usual
/// `<repo>/commit/<hash>` shape.
fn repo_url_from_commit(commit_url: &str) -> Option<&str> {
    commit_url.rfind("/commit/").map(|at| &commit_url[..at])
}
