// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Immutable measurement records.
//!
//! A [`Run`] is one CI execution's complete benchmark batch for one tool and
//! one [`Commit`]. Runs and commits are created once at ingestion and never
//! mutated afterwards; the history store only ever appends them.
//!
//! Every record carries a flattened `extra` map so that fields this version
//! does not recognize survive a decode/encode cycle unchanged. The map is
//! ordered by key, which keeps re-encoding deterministic.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Identity of a commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Forge username.
    pub username: String,
}

/// Immutable record of the code revision a measurement batch belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Author identity.
    pub author: CommitIdentity,
    /// Committer identity.
    pub committer: CommitIdentity,
    /// Whether this commit is distinct from prior pushes.
    pub distinct: bool,
    /// Content hash identifying the revision.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Commit instant, offset preserved as reported by the VCS.
    pub timestamp: DateTime<FixedOffset>,
    /// Hash of the tree object.
    pub tree_id: String,
    /// Source URL of the commit.
    pub url: String,
    /// Unrecognized fields, preserved opaquely.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One named metric measured within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    /// Metric name, unique within one tool and run.
    pub name: String,
    /// Aggregated measurement value. Kept as a raw JSON number so integer
    /// values are not rewritten as floats on round-trip.
    pub value: Number,
    /// Symmetric error magnitude, rendered as reported (`"± N"`).
    pub range: String,
    /// Unit tag, e.g. `ns/iter`.
    pub unit: String,
    /// Unrecognized fields, preserved opaquely.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One CI execution for one tool: the measured commit, the capture time and
/// the ordered benchmark batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The commit this batch measured.
    pub commit: Commit,
    /// Capture time in milliseconds since the Unix epoch. Authoritative for
    /// sequencing within a tool series.
    pub date: i64,
    /// Originating automation identifier.
    pub tool: String,
    /// Benchmarks in harness emission order.
    pub benches: Vec<Benchmark>,
    /// Unrecognized fields, preserved opaquely.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Run {
    /// Look up a benchmark by metric name.
    pub fn bench(&self, name: &str) -> Option<&Benchmark> {
        self.benches.iter().find(|b| b.name == name)
    }

    /// Names of all benchmarks in this run, in emission order.
    pub fn bench_names(&self) -> impl Iterator<Item = &str> {
        self.benches.iter().map(|b| b.name.as_str())
    }
}
