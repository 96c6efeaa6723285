// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! The in-memory history store.
//!
//! A [`History`] maps each tool identifier to its series of runs, ordered
//! strictly ascending by capture date. The store is append-only: merging a
//! run never edits or removes a run already present, and an out-of-order
//! arrival is inserted at the position that restores the chronological
//! invariant. Tool keys keep their insertion order so the persisted artifact
//! is stable across merge cycles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use benchwatch_core::model::Run;

use crate::error::{Result, StoreError};

/// The full persisted state: store-wide metadata plus one series per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Instant of the newest merged run, milliseconds since the Unix epoch.
    #[serde(rename = "lastUpdate")]
    pub last_update: i64,
    /// Repository origin identifier.
    #[serde(rename = "repoUrl")]
    pub repo_url: String,
    /// Per-tool run series, chronological ascending.
    pub entries: IndexMap<String, Vec<Run>>,
    /// Unrecognized top-level fields, preserved opaquely.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl History {
    /// A fresh store with no runs, as produced by first-run bootstrap.
    pub fn empty() -> Self {
        Self {
            last_update: 0,
            repo_url: String::new(),
            entries: IndexMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Whether no run has ever been merged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tool identifiers in artifact order.
    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The run series for `tool`.
    ///
    /// Returns [`StoreError::ToolNotFound`] when the tool was never merged.
    pub fn series(&self, tool: &str) -> Result<&[Run]> {
        self.entries
            .get(tool)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::ToolNotFound(tool.to_string()))
    }

    /// Merge one run into the series for its tool, creating the series when
    /// absent.
    ///
    /// The run is inserted at the first position whose date is greater than
    /// the run's date, so equal-timestamp runs land after the ones already
    /// present. Runs already in the series are untouched. `last_update`
    /// moves forward to the run's date if that is later.
    ///
    /// Two runs carrying the same commit id both persist: the store tracks
    /// measurement runs, not unique commits. Duplicate suppression, if
    /// wanted, is caller policy applied before calling this.
    pub fn merge(&mut self, run: Run) {
        if run.date > self.last_update {
            self.last_update = run.date;
        }
        let series = self.entries.entry(run.tool.clone()).or_default();
        let at = series.partition_point(|existing| existing.date <= run.date);
        series.insert(at, run);
    }
}

impl Default for History {
    fn default() -> Self {
        Self::empty()
    }
}
