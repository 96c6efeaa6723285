// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Validation of raw harness output into a [`Run`].
//!
//! The benchmarking harness emits one batch per CI execution: a tool
//! identifier, the commit metadata supplied by the VCS layer, and an ordered
//! list of `(name, value, variance, unit)` measurements. [`RawBatch`]
//! validates that shape and produces a [`Run`] stamped with the capture
//! time. Validation is a pure transformation; nothing is persisted here and
//! a rejected batch leaves no trace.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use thiserror::Error;

use crate::model::{Benchmark, Commit, Run};

/// Errors produced while validating a raw measurement batch.
///
/// All of these reject the batch before any store mutation; the caller can
/// correct the input and retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The tool identifier is empty.
    #[error("tool identifier is empty")]
    EmptyTool,

    /// The commit identifier is empty.
    #[error("commit id is empty")]
    EmptyCommitId,

    /// The batch contains no measurements.
    #[error("measurement batch is empty")]
    EmptyBatch,

    /// A measurement has an empty name.
    #[error("benchmark name is empty")]
    EmptyName,

    /// The same benchmark name appears twice in one batch.
    #[error("duplicate benchmark name in batch: {0}")]
    DuplicateName(String),

    /// A measurement value is NaN or infinite.
    #[error("non-finite value for benchmark: {0}")]
    NonFiniteValue(String),

    /// A variance magnitude is negative.
    #[error("negative variance for benchmark: {0}")]
    NegativeVariance(String),
}

/// Result type for batch validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// One raw measurement as emitted by the harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// Metric name.
    pub name: String,
    /// Aggregated value.
    pub value: Number,
    /// Symmetric error magnitude. Missing means zero.
    #[serde(default)]
    pub variance: Option<Number>,
    /// Unit tag.
    pub unit: String,
}

/// One harness output batch: everything needed to form a [`Run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    /// Originating automation identifier.
    pub tool: String,
    /// Commit metadata from the VCS layer.
    pub commit: Commit,
    /// Measurements in harness emission order.
    pub benches: Vec<RawMeasurement>,
}

// Capture times must be non-decreasing across calls within one process even
// if the wall clock steps backwards.
static LAST_CAPTURE_MS: AtomicI64 = AtomicI64::new(0);

fn capture_now_ms() -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_CAPTURE_MS.fetch_max(now, Ordering::SeqCst);
    now.max(prev)
}

impl RawBatch {
    /// Validate this batch and convert it into a [`Run`].
    ///
    /// The run's `date` is the capture time, monotonically non-decreasing
    /// across calls within one process. Benchmark order is preserved.
    pub fn into_run(self) -> Result<Run> {
        if self.tool.is_empty() {
            return Err(ValidationError::EmptyTool);
        }
        if self.commit.id.is_empty() {
            return Err(ValidationError::EmptyCommitId);
        }
        if self.benches.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.benches.len());
        for m in &self.benches {
            if m.name.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !seen.insert(m.name.as_str()) {
                return Err(ValidationError::DuplicateName(m.name.clone()));
            }
            match m.value.as_f64() {
                Some(v) if v.is_finite() => {}
                _ => return Err(ValidationError::NonFiniteValue(m.name.clone())),
            }
            if let Some(variance) = &m.variance {
                match variance.as_f64() {
                    Some(v) if v.is_finite() => {
                        if v < 0.0 {
                            return Err(ValidationError::NegativeVariance(m.name.clone()));
                        }
                    }
                    _ => return Err(ValidationError::NonFiniteValue(m.name.clone())),
                }
            }
        }

        let benches = self
            .benches
            .into_iter()
            .map(|m| {
                let range = match &m.variance {
                    Some(v) => format!("± {}", v),
                    None => "± 0".to_string(),
                };
                Benchmark {
                    name: m.name,
                    value: m.value,
                    range,
                    unit: m.unit,
                    extra: serde_json::Map::new(),
                }
            })
            .collect();

        Ok(Run {
            commit: self.commit,
            date: capture_now_ms(),
            tool: self.tool,
            benches,
            extra: serde_json::Map::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitIdentity;
    use chrono::DateTime;

    fn commit() -> Commit {
        Commit {
            author: CommitIdentity {
                email: "dev@example.com".to_string(),
                name: "Dev".to_string(),
                username: "dev".to_string(),
            },
            committer: CommitIdentity {
                email: "dev@example.com".to_string(),
                name: "Dev".to_string(),
                username: "dev".to_string(),
            },
            distinct: true,
            id: "abc123".to_string(),
            message: "m".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2023-11-12T20:24:44+08:00").unwrap(),
            tree_id: "def456".to_string(),
            url: "https://example.com/commit/abc123".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    fn measurement(name: &str, value: i64) -> RawMeasurement {
        RawMeasurement {
            name: name.to_string(),
            value: Number::from(value),
            variance: Some(Number::from(2)),
            unit: "ns/iter".to_string(),
        }
    }

    fn batch(benches: Vec<RawMeasurement>) -> RawBatch {
        RawBatch {
            tool: "cargo".to_string(),
            commit: commit(),
            benches,
        }
    }

    #[test]
    fn test_valid_batch_becomes_run() {
        let run = batch(vec![measurement("a", 31), measurement("b", 42)])
            .into_run()
            .unwrap();
        assert_eq!(run.tool, "cargo");
        assert_eq!(run.commit.id, "abc123");
        assert_eq!(run.benches.len(), 2);
        assert_eq!(run.benches[0].name, "a");
        assert_eq!(run.benches[0].range, "± 2");
        assert_eq!(run.benches[1].name, "b");
        assert!(run.date > 0);
    }

    #[test]
    fn test_missing_variance_renders_zero_range() {
        let mut m = measurement("a", 31);
        m.variance = None;
        let run = batch(vec![m]).into_run().unwrap();
        assert_eq!(run.benches[0].range, "± 0");
    }

    #[test]
    fn test_empty_tool_rejected() {
        let mut b = batch(vec![measurement("a", 1)]);
        b.tool = String::new();
        assert_eq!(b.into_run().unwrap_err(), ValidationError::EmptyTool);
    }

    #[test]
    fn test_empty_commit_id_rejected() {
        let mut b = batch(vec![measurement("a", 1)]);
        b.commit.id = String::new();
        assert_eq!(b.into_run().unwrap_err(), ValidationError::EmptyCommitId);
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert_eq!(batch(vec![]).into_run().unwrap_err(), ValidationError::EmptyBatch);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            batch(vec![measurement("", 1)]).into_run().unwrap_err(),
            ValidationError::EmptyName
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        assert_eq!(
            batch(vec![measurement("a", 1), measurement("a", 2)])
                .into_run()
                .unwrap_err(),
            ValidationError::DuplicateName("a".to_string())
        );
    }

    #[test]
    fn test_negative_variance_rejected() {
        let mut m = measurement("a", 1);
        m.variance = Some(Number::from(-3));
        assert_eq!(
            batch(vec![m]).into_run().unwrap_err(),
            ValidationError::NegativeVariance("a".to_string())
        );
    }

    #[test]
    fn test_capture_time_is_non_decreasing() {
        let first = batch(vec![measurement("a", 1)]).into_run().unwrap();
        let second = batch(vec![measurement("a", 1)]).into_run().unwrap();
        assert!(second.date >= first.date);
    }

    #[test]
    fn test_batch_deserializes_from_json() {
        let raw = r#"{
            "tool": "cargo",
            "commit": {
                "author": {"email":"a@b.c","name":"A","username":"a"},
                "committer": {"email":"a@b.c","name":"A","username":"a"},
                "distinct": true,
                "id": "abc",
                "message": "m",
                "timestamp": "2023-11-12T20:24:44+08:00",
                "tree_id": "def",
                "url": "https://example.com/commit/abc"
            },
            "benches": [
                {"name": "parse", "value": 7384641, "variance": 62175, "unit": "ns/iter"}
            ]
        }"#;
        let b: RawBatch = serde_json::from_str(raw).unwrap();
        let run = b.into_run().unwrap();
        assert_eq!(run.benches[0].range, "± 62175");
    }
}
