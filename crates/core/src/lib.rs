// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement model and regression analyzer for Benchwatch.
//!
//! This crate holds everything that does not touch storage: the typed
//! representation of commits, benchmark measurements and runs, validation of
//! raw harness batches, and the baseline/regression classifier.
//!
//! # Modules
//!
//! - [`model`] - Immutable records: commit, benchmark, run
//! - [`batch`] - Validation of raw harness output into a [`model::Run`]
//! - [`analyze`] - Baseline selection and regression classification

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analyze;
pub mod batch;
pub mod model;

pub use analyze::{Alert, AnalyzerConfig, Classification, CompareMode};
pub use batch::{RawBatch, RawMeasurement, ValidationError};
pub use model::{Benchmark, Commit, CommitIdentity, Run};
