// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown rendering of a cycle's alerts.
//!
//! Produces a report suitable for a CI comment body. Rendering is pure text
//! generation; delivering the report anywhere is the caller's concern.

use std::fmt::Write;

use benchwatch_core::analyze::Classification;

use crate::pipeline::CycleOutcome;

fn marker(classification: Classification) -> &'static str {
    match classification {
        Classification::Regression => "🚨 regression",
        Classification::Warning => "⚠️ warning",
        Classification::Improvement => "improvement",
        Classification::New => "new",
        Classification::WithinTolerance => "ok",
    }
}

/// Render the markdown report for one ingestion cycle.
pub fn render_cycle_report(outcome: &CycleOutcome) -> String {
    let mut out = String::new();

    writeln!(out, "# Benchmark report for `{}`", outcome.tool).unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "Commit: [`{}`]({}) {}",
        short_id(&outcome.commit.id),
        outcome.commit.url,
        first_line(&outcome.commit.message)
    )
    .unwrap();
    let captured = chrono::DateTime::from_timestamp_millis(outcome.run_date)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| outcome.run_date.to_string());
    writeln!(out, "Captured: {captured}").unwrap();
    writeln!(out).unwrap();

    if outcome.alerts.is_empty() {
        writeln!(out, "No benchmarks moved outside tolerance.").unwrap();
    } else {
        writeln!(out, "## Alerts").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "| Benchmark | Previous | Current | Change | Status |").unwrap();
        writeln!(out, "|-----------|----------|---------|--------|--------|").unwrap();
        for alert in &outcome.alerts {
            writeln!(
                out,
                "| {} | {} {} | {} {} | {:+.2}% | {} |",
                alert.benchmark,
                alert.baseline,
                alert.unit,
                alert.current,
                alert.unit,
                alert.delta * 100.0,
                marker(alert.classification)
            )
            .unwrap();
        }
    }

    if !outcome.new_benchmarks.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "## New benchmarks").unwrap();
        writeln!(out).unwrap();
        for name in &outcome.new_benchmarks {
            writeln!(out, "- {name}").unwrap();
        }
    }

    writeln!(out).unwrap();
    writeln!(out, "---").unwrap();
    writeln!(out, "Runs in series: {}", outcome.runs_in_series).unwrap();

    out
}

fn short_id(id: &str) -> &str {
    if id.len() > 7 { &id[..7] } else { id }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
