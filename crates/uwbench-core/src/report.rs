//! Presentation of benchmark results.

use comfy_table::presets::ASCII_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;
use uwbench_warehouse::BackendKind;

use crate::error::RunError;
use crate::runner::{BenchmarkResult, RunState};

pub const QUERY_NAME_HEADER: &str = "Query Name";
pub const ELAPSED_HEADER: &str = "Execution Time (s)";

/// Grid table with one row per result, in the given order.
pub fn render_table(results: &[BenchmarkResult]) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec![QUERY_NAME_HEADER, ELAPSED_HEADER]);

    for result in results {
        table.add_row(vec![
            result.label.clone(),
            format_seconds(result.elapsed_seconds),
        ]);
    }

    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    table.to_string()
}

pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.6}")
}

/// Machine-readable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: String,
    pub backend: &'static str,
    pub status: RunState,
    pub results: Vec<BenchmarkResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn completed(backend: BackendKind, results: Vec<BenchmarkResult>) -> Self {
        Self::new(backend, RunState::Completed, results)
    }

    /// Report for a run stopped by `error`, keeping the partial results.
    pub fn aborted(backend: BackendKind, error: &RunError) -> Self {
        let mut report = Self::new(backend, RunState::Aborted, error.completed().to_vec());
        if let RunError::QueryFailed { label, .. } = error {
            report.failed_query = Some(label.clone());
        }
        report.error = Some(error.to_string());
        report
    }

    /// Report for a run that never reached the first query.
    pub fn not_started(backend: BackendKind, error: impl ToString) -> Self {
        let mut report = Self::new(backend, RunState::NotStarted, Vec::new());
        report.error = Some(error.to_string());
        report
    }

    fn new(backend: BackendKind, status: RunState, results: Vec<BenchmarkResult>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| String::from("<unformattable>")),
            backend: backend.as_str(),
            status,
            results,
            failed_query: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunState::Completed
    }
}
