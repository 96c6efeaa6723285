//! Optional TOML configuration for analyzer tolerances.
//!
//! Every setting here can also be given as a flag; flags win over file
//! values, and anything left unset falls back to the built-in defaults.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use benchwatch_core::analyze::{AnalyzerConfig, CompareMode};

/// Settings read from a `--config` TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Comparator direction.
    pub mode: Option<CompareMode>,
    /// Fractional noise tolerance.
    pub threshold: Option<f64>,
    /// Fractional regression alert threshold.
    pub alert_threshold: Option<f64>,
    /// Global identifier used in the artifact assignment.
    pub global_ident: Option<String>,
    /// Repository origin override.
    pub repo_url: Option<String>,
}

impl FileConfig {
    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Combine file values with flag overrides into an [`AnalyzerConfig`].
    pub fn analyzer(
        &self,
        mode: Option<CompareMode>,
        threshold: Option<f64>,
        alert_threshold: Option<f64>,
    ) -> AnalyzerConfig {
        let defaults = AnalyzerConfig::default();
        AnalyzerConfig {
            mode: mode.or(self.mode).unwrap_or(defaults.mode),
            threshold: threshold.or(self.threshold).unwrap_or(defaults.threshold),
            alert_threshold: alert_threshold
                .or(self.alert_threshold)
                .unwrap_or(defaults.alert_threshold),
        }
    }
}
