use std::io::Write;

use comfy_table::presets::ASCII_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use uwbench_core::warehouse::BackendKind;
use uwbench_core::{render_table, BenchmarkResult, Catalog};

use crate::error::CliError;

pub fn connected(out: &mut dyn Write, backend: BackendKind) -> Result<(), CliError> {
    writeln!(out, "Connected to {backend} successfully.")?;
    Ok(())
}

pub fn executed(out: &mut dyn Write, label: &str) -> Result<(), CliError> {
    writeln!(out, "Executed query: {label}")?;
    Ok(())
}

pub fn results(out: &mut dyn Write, results: &[BenchmarkResult]) -> Result<(), CliError> {
    writeln!(out, "Benchmark Results:")?;
    writeln!(out, "{}", render_table(results))?;
    Ok(())
}

/// Failure line, followed by whatever finished before the failure.
pub fn failure(
    out: &mut dyn Write,
    cause: &dyn std::fmt::Display,
    partial: &[BenchmarkResult],
) -> Result<(), CliError> {
    writeln!(out, "Error: {cause}")?;
    if !partial.is_empty() {
        writeln!(out, "Partial Benchmark Results:")?;
        writeln!(out, "{}", render_table(partial))?;
    }
    Ok(())
}

pub fn closed(out: &mut dyn Write, backend: BackendKind) -> Result<(), CliError> {
    writeln!(out, "{backend} connection closed.")?;
    Ok(())
}

pub fn json<T: Serialize>(out: &mut dyn Write, value: &T, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{payload}")?;
    Ok(())
}

pub fn catalog_table(out: &mut dyn Write, catalog: &Catalog) -> Result<(), CliError> {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec!["#", "Query Name", "Statement"]);

    for (index, query) in catalog.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            query.label.clone(),
            query.sql.clone(),
        ]);
    }

    writeln!(out, "{table}")?;
    Ok(())
}
