// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Baseline selection and regression classification.
//!
//! For each benchmark in an incoming run, the analyzer finds the most recent
//! prior run in the same tool series that measured the same metric name and
//! classifies the new value against that baseline. A metric absent from
//! intervening runs is not treated as zero; the search simply skips runs
//! that did not measure it.
//!
//! Classification is deterministic: identical history, run and configuration
//! produce identical output. No wall-clock reads happen here; every
//! timestamp comes from the inputs.

use serde::{Deserialize, Serialize};

use crate::model::Run;

/// Direction in which a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    /// Smaller values are better (latency, duration).
    LowerIsBetter,
    /// Larger values are better (throughput).
    HigherIsBetter,
}

impl Default for CompareMode {
    fn default() -> Self {
        CompareMode::LowerIsBetter
    }
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareMode::LowerIsBetter => f.write_str("lower-is-better"),
            CompareMode::HigherIsBetter => f.write_str("higher-is-better"),
        }
    }
}

impl std::str::FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lower-is-better" => Ok(CompareMode::LowerIsBetter),
            "higher-is-better" => Ok(CompareMode::HigherIsBetter),
            other => Err(format!(
                "unknown compare mode `{other}` (expected `lower-is-better` or `higher-is-better`)"
            )),
        }
    }
}

/// Tolerance configuration for one analysis pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Comparator direction.
    #[serde(default)]
    pub mode: CompareMode,
    /// Fractional tolerance below which a change is noise (0.02 = 2%).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Fractional change at which a regression alert fires. Always treated
    /// as at least `threshold`.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
}

fn default_threshold() -> f64 {
    0.02
}

fn default_alert_threshold() -> f64 {
    0.05
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: CompareMode::default(),
            threshold: default_threshold(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

impl AnalyzerConfig {
    fn effective_alert_threshold(&self) -> f64 {
        self.alert_threshold.max(self.threshold)
    }
}

/// Outcome of comparing one benchmark against its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// No usable baseline exists for this metric.
    New,
    /// The change is within the configured tolerance.
    WithinTolerance,
    /// The metric moved in the good direction past the tolerance.
    Improvement,
    /// The metric moved in the bad direction past the tolerance but below
    /// the alert threshold.
    Warning,
    /// The metric moved in the bad direction past the alert threshold.
    Regression,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Classification::New => "new",
            Classification::WithinTolerance => "within-tolerance",
            Classification::Improvement => "improvement",
            Classification::Warning => "warning",
            Classification::Regression => "regression",
        };
        f.write_str(s)
    }
}

/// A derived judgement about one benchmark in one run.
///
/// Alerts are produced fresh per evaluation and never written into the
/// history artifact; delivery is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Tool the benchmark belongs to.
    pub tool: String,
    /// Metric name.
    pub benchmark: String,
    /// Unit tag of the new measurement.
    pub unit: String,
    /// Baseline value the comparison used.
    pub baseline: f64,
    /// Newly measured value.
    pub current: f64,
    /// Fractional delta, `(current - baseline) / |baseline|`.
    pub delta: f64,
    /// How the change was classified.
    pub classification: Classification,
}

/// Everything an analysis pass produced for one run.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// One alert per benchmark classified outside tolerance.
    pub alerts: Vec<Alert>,
    /// Names that had no usable baseline, in emission order.
    pub new_benchmarks: Vec<String>,
}

/// Find the baseline value for `name`: the most recent run in `prior` that
/// measured it. Runs that did not measure the metric are skipped.
fn baseline_for(prior: &[Run], name: &str) -> Option<f64> {
    prior
        .iter()
        .rev()
        .find_map(|run| run.bench(name))
        .and_then(|b| b.value.as_f64())
}

/// Classify every benchmark of `run` against `prior`, the tool series as it
/// existed immediately before merging the run.
pub fn analyze_run(prior: &[Run], run: &Run, config: &AnalyzerConfig) -> Analysis {
    let alert_threshold = config.effective_alert_threshold();
    let mut analysis = Analysis::default();

    for bench in &run.benches {
        let current = match bench.value.as_f64() {
            Some(v) if v.is_finite() => v,
            _ => {
                analysis.new_benchmarks.push(bench.name.clone());
                continue;
            }
        };

        let baseline = match baseline_for(prior, &bench.name) {
            Some(b) if b != 0.0 => b,
            // A zero or absent baseline is non-comparable; the metric
            // counts as new here.
            _ => {
                analysis.new_benchmarks.push(bench.name.clone());
                continue;
            }
        };

        let delta = (current - baseline) / baseline.abs();
        let adverse = match config.mode {
            CompareMode::LowerIsBetter => delta,
            CompareMode::HigherIsBetter => -delta,
        };

        let classification = if adverse >= alert_threshold {
            Classification::Regression
        } else if adverse >= config.threshold {
            Classification::Warning
        } else if adverse <= -config.threshold {
            Classification::Improvement
        } else {
            Classification::WithinTolerance
        };

        if classification != Classification::WithinTolerance {
            analysis.alerts.push(Alert {
                tool: run.tool.clone(),
                benchmark: bench.name.clone(),
                unit: bench.unit.clone(),
                baseline,
                current,
                delta,
                classification,
            });
        }
    }

    analysis
}
