use std::io::Write;

use tracing::{info, warn};
use uwbench_core::{
    BenchConfig, BenchmarkResult, BenchmarkRunner, Catalog, ConfigOverrides, RunObserver,
    RunReport, Session,
};

use super::to_backend_kind;
use crate::cli::{OutputFormat, RunArgs};
use crate::error::{CliError, EXIT_CONNECTION_FAILED, EXIT_RUN_ABORTED, EXIT_SUCCESS};
use crate::output;

pub fn run(
    args: &RunArgs,
    format: OutputFormat,
    pretty: bool,
    out: &mut dyn Write,
) -> Result<u8, CliError> {
    let overrides = ConfigOverrides {
        backend: args.backend.map(to_backend_kind),
        catalog_path: args.catalog.clone(),
        duckdb_path: args.duckdb_path.clone(),
        read_only: args.read_only,
    };
    let config = BenchConfig::from_env(&overrides)?;
    let catalog = config.load_catalog()?;
    let kind = config.backend.kind();

    info!(backend = kind.as_str(), queries = catalog.len(), "opening session");
    let session = match Session::open(&config.backend) {
        Ok(session) => session,
        Err(error) => {
            warn!(backend = kind.as_str(), %error, "connection failed");
            match format {
                OutputFormat::Table => output::failure(out, &error, &[])?,
                OutputFormat::Json => {
                    output::json(out, &RunReport::not_started(kind, &error), pretty)?
                }
            }
            return Ok(EXIT_CONNECTION_FAILED);
        }
    };

    benchmark(session, &catalog, format, pretty, out)
}

/// Runs `catalog` on an open session and writes the outcome.
///
/// The session is closed on every path; a failing query still yields the
/// results that completed before it. A close failure is logged and leaves the
/// status untouched.
pub(crate) fn benchmark(
    mut session: Session,
    catalog: &Catalog,
    format: OutputFormat,
    pretty: bool,
    out: &mut dyn Write,
) -> Result<u8, CliError> {
    let kind = session.kind();
    let table = format == OutputFormat::Table;

    if table {
        output::connected(out, kind)?;
    }

    let mut progress = ProgressPrinter::new(if table { Some(&mut *out) } else { None });
    let outcome = BenchmarkRunner::new().run(session.connection(), catalog, &mut progress);
    progress.finish()?;

    let status = match &outcome {
        Ok(results) => {
            match format {
                OutputFormat::Table => output::results(out, results)?,
                OutputFormat::Json => {
                    output::json(out, &RunReport::completed(kind, results.clone()), pretty)?
                }
            }
            EXIT_SUCCESS
        }
        Err(error) => {
            match format {
                OutputFormat::Table => {
                    let cause = match error {
                        uwbench_core::RunError::QueryFailed { source, .. } => source.to_string(),
                        other => other.to_string(),
                    };
                    output::failure(out, &cause, error.completed())?
                }
                OutputFormat::Json => {
                    output::json(out, &RunReport::aborted(kind, error), pretty)?
                }
            }
            EXIT_RUN_ABORTED
        }
    };

    // Results are already written; a failed teardown does not change the outcome.
    match session.close() {
        Ok(()) if table => output::closed(out, kind)?,
        Ok(()) => {}
        Err(error) => warn!(backend = kind.as_str(), %error, "failed to close warehouse connection"),
    }

    Ok(status)
}

/// Prints `Executed query: <label>` as each query completes.
///
/// Observer callbacks cannot fail, so the first write error is held and
/// surfaced by [`ProgressPrinter::finish`].
struct ProgressPrinter<'a> {
    out: Option<&'a mut dyn Write>,
    error: Option<CliError>,
}

impl<'a> ProgressPrinter<'a> {
    fn new(out: Option<&'a mut dyn Write>) -> Self {
        Self { out, error: None }
    }

    fn finish(self) -> Result<(), CliError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl RunObserver for ProgressPrinter<'_> {
    fn query_completed(&mut self, result: &BenchmarkResult) {
        if self.error.is_some() {
            return;
        }
        if let Some(out) = self.out.as_deref_mut() {
            if let Err(error) = output::executed(out, &result.label) {
                self.error = Some(error);
            }
        }
    }
}
