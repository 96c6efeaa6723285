// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Store-level error taxonomy.

use thiserror::Error;

/// Errors produced by the history store and artifact serializer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted artifact is unreadable. Fatal for the ingestion cycle:
    /// merging against an unreadable base would silently discard history.
    #[error("corrupt history artifact: {0}")]
    Corrupt(String),

    /// A query named a tool that was never merged. Recoverable; it signals
    /// "no history yet".
    #[error("no history for tool `{0}`")]
    ToolNotFound(String),

    /// The history could not be encoded into artifact text.
    #[error("failed to encode history artifact")]
    Encode(#[source] serde_json::Error),

    /// The storage boundary failed.
    #[error("history artifact io failed")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
