use std::path::PathBuf;

use thiserror::Error;
use uwbench_warehouse::WarehouseError;

use crate::runner::{BenchmarkResult, RunState};

/// Catalog loading and validation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog must contain at least one query")]
    Empty,
    #[error("query at position {index} has a blank label")]
    BlankLabel { index: usize },
    #[error("duplicate query label '{label}'")]
    DuplicateLabel { label: String },
    #[error("query '{label}' has a blank statement")]
    BlankStatement { label: String },
}

/// Configuration resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },

    #[error("unknown backend '{value}', expected one of snowflake, duckdb")]
    UnknownBackend { value: String },
}

/// Benchmark run failures.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("benchmark runner already used (state: {state})")]
    Reused { state: RunState },

    /// A query failed; `completed` holds the results gathered before it.
    #[error("benchmark run failed at '{label}': {source}")]
    QueryFailed {
        label: String,
        completed: Vec<BenchmarkResult>,
        #[source]
        source: WarehouseError,
    },
}

impl RunError {
    /// Results that completed before the run stopped.
    pub fn completed(&self) -> &[BenchmarkResult] {
        match self {
            Self::Reused { .. } => &[],
            Self::QueryFailed { completed, .. } => completed,
        }
    }
}
