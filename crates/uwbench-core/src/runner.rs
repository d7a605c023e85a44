//! Sequential, timed execution of a catalog against one connection.
//!
//! Each statement runs on its own cursor. Timing brackets only the submit and
//! wait; the cursor is released before any execution error is returned. The
//! first failing statement stops the run, and the results gathered so far
//! travel with the error.

use std::fmt::{Display, Formatter};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use uwbench_warehouse::{WarehouseConnection, WarehouseError};

use crate::catalog::Catalog;
use crate::error::RunError;

/// Elapsed wall-clock time for one completed query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub label: String,
    pub elapsed_seconds: f64,
}

impl BenchmarkResult {
    pub fn new(label: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_seconds,
        }
    }
}

/// Lifecycle of a [`BenchmarkRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

impl RunState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Progress hooks invoked while a catalog runs.
pub trait RunObserver {
    fn query_started(&mut self, _label: &str) {}

    fn query_completed(&mut self, _result: &BenchmarkResult) {}
}

impl RunObserver for () {}

/// Time one statement on a fresh cursor.
///
/// # Errors
/// Returns the warehouse error unchanged. The cursor is released first.
pub fn time_query<C: Clock + ?Sized>(
    clock: &C,
    connection: &mut dyn WarehouseConnection,
    sql: &str,
) -> Result<f64, WarehouseError> {
    let mut cursor = connection.cursor()?;

    let started = clock.now();
    let outcome = cursor.execute(sql);
    let finished = clock.now();

    drop(cursor);

    let outcome = outcome?;
    let elapsed = finished.saturating_duration_since(started);
    debug!(
        rows = outcome.row_count,
        query_id = outcome.query_id.as_deref().unwrap_or_default(),
        elapsed_ms = elapsed.as_millis() as u64,
        "statement finished"
    );

    Ok(elapsed.as_secs_f64())
}

/// Single-use runner: `NotStarted → Running → Completed | Aborted`.
#[derive(Debug)]
pub struct BenchmarkRunner<C = MonotonicClock> {
    clock: C,
    state: RunState,
}

impl BenchmarkRunner<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for BenchmarkRunner<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> BenchmarkRunner<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every catalog entry in order.
    ///
    /// # Errors
    /// [`RunError::QueryFailed`] on the first failing statement, carrying the
    /// results completed before it; [`RunError::Reused`] if this runner has
    /// already run.
    pub fn run(
        &mut self,
        connection: &mut dyn WarehouseConnection,
        catalog: &Catalog,
        observer: &mut dyn RunObserver,
    ) -> Result<Vec<BenchmarkResult>, RunError> {
        if self.state != RunState::NotStarted {
            return Err(RunError::Reused { state: self.state });
        }
        self.transition(RunState::Running);

        let mut results = Vec::with_capacity(catalog.len());
        for query in catalog {
            observer.query_started(&query.label);

            match time_query(&self.clock, connection, &query.sql) {
                Ok(elapsed_seconds) => {
                    let result = BenchmarkResult::new(query.label.clone(), elapsed_seconds);
                    info!(query = %result.label, elapsed_seconds, "query completed");
                    observer.query_completed(&result);
                    results.push(result);
                }
                Err(source) => {
                    warn!(query = %query.label, error = %source, "query failed; aborting run");
                    self.transition(RunState::Aborted);
                    return Err(RunError::QueryFailed {
                        label: query.label.clone(),
                        completed: results,
                        source,
                    });
                }
            }
        }

        self.transition(RunState::Completed);
        Ok(results)
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "runner state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NamedQuery;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;
    use uwbench_warehouse::{BackendKind, Cursor, QueryOutcome};

    #[derive(Default)]
    struct Counters {
        opened: Cell<usize>,
        released: Cell<usize>,
        executed: Cell<usize>,
    }

    struct StubConnection {
        counters: Rc<Counters>,
        fail_on: Option<usize>,
    }

    struct StubCursor {
        counters: Rc<Counters>,
        fail: bool,
    }

    impl Cursor for StubCursor {
        fn execute(&mut self, _sql: &str) -> Result<QueryOutcome, WarehouseError> {
            self.counters.executed.set(self.counters.executed.get() + 1);
            if self.fail {
                return Err(WarehouseError::Protocol(String::from("stub failure")));
            }
            Ok(QueryOutcome::default())
        }
    }

    impl Drop for StubCursor {
        fn drop(&mut self) {
            self.counters.released.set(self.counters.released.get() + 1);
        }
    }

    impl WarehouseConnection for StubConnection {
        fn kind(&self) -> BackendKind {
            BackendKind::DuckDb
        }

        fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>, WarehouseError> {
            let attempt = self.counters.opened.get() + 1;
            self.counters.opened.set(attempt);
            Ok(Box::new(StubCursor {
                counters: Rc::clone(&self.counters),
                fail: self.fail_on == Some(attempt),
            }))
        }

        fn close(self: Box<Self>) -> Result<(), WarehouseError> {
            Ok(())
        }
    }

    /// Advances by a fixed step on every reading.
    struct SteppingClock {
        base: Instant,
        ticks: Cell<u32>,
        step: Duration,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Instant {
            let tick = self.ticks.get();
            self.ticks.set(tick + 1);
            self.base + self.step * tick
        }
    }

    fn catalog(labels: &[&str]) -> Catalog {
        Catalog::new(
            labels
                .iter()
                .map(|label| NamedQuery::new(*label, format!("SELECT '{label}'")))
                .collect(),
        )
        .expect("catalog")
    }

    #[test]
    fn time_query_measures_between_submit_and_completion() {
        let counters = Rc::new(Counters::default());
        let mut connection = StubConnection {
            counters: Rc::clone(&counters),
            fail_on: None,
        };
        let clock = SteppingClock {
            base: Instant::now(),
            ticks: Cell::new(0),
            step: Duration::from_millis(250),
        };

        let elapsed = time_query(&clock, &mut connection, "SELECT 1").expect("timed");

        assert!((elapsed - 0.25).abs() < 1e-9);
        assert_eq!(clock.ticks.get(), 2);
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn time_query_releases_cursor_before_returning_error() {
        let counters = Rc::new(Counters::default());
        let mut connection = StubConnection {
            counters: Rc::clone(&counters),
            fail_on: Some(1),
        };

        let error = time_query(&MonotonicClock, &mut connection, "SELECT broken")
            .expect_err("stub fails");

        assert!(matches!(error, WarehouseError::Protocol(_)));
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn run_completes_all_queries_in_order() {
        let counters = Rc::new(Counters::default());
        let mut connection = StubConnection {
            counters: Rc::clone(&counters),
            fail_on: None,
        };
        let mut runner = BenchmarkRunner::new();

        let results = runner
            .run(&mut connection, &catalog(&["A", "B", "C"]), &mut ())
            .expect("run");

        assert_eq!(
            results.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        assert!(results.iter().all(|r| r.elapsed_seconds >= 0.0));
        assert_eq!(runner.state(), RunState::Completed);
        assert_eq!(counters.opened.get(), counters.released.get());
    }

    #[test]
    fn run_aborts_at_first_failure_and_keeps_partial_results() {
        let counters = Rc::new(Counters::default());
        let mut connection = StubConnection {
            counters: Rc::clone(&counters),
            fail_on: Some(2),
        };
        let mut runner = BenchmarkRunner::new();

        let error = runner
            .run(&mut connection, &catalog(&["A", "B", "C"]), &mut ())
            .expect_err("second query fails");

        match &error {
            RunError::QueryFailed {
                label, completed, ..
            } => {
                assert_eq!(label, "B");
                assert_eq!(completed.len(), 1);
                assert_eq!(completed[0].label, "A");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(counters.executed.get(), 2);
        assert_eq!(counters.released.get(), 2);
        assert_eq!(runner.state(), RunState::Aborted);
        assert!(error.to_string().starts_with("benchmark run failed at 'B'"));
    }

    #[test]
    fn runner_is_single_use() {
        let counters = Rc::new(Counters::default());
        let mut connection = StubConnection {
            counters: Rc::clone(&counters),
            fail_on: None,
        };
        let mut runner = BenchmarkRunner::new();
        runner
            .run(&mut connection, &catalog(&["A"]), &mut ())
            .expect("first run");

        let error = runner
            .run(&mut connection, &catalog(&["A"]), &mut ())
            .expect_err("second run");

        assert!(matches!(
            error,
            RunError::Reused {
                state: RunState::Completed
            }
        ));
        assert_eq!(counters.executed.get(), 1);
    }
}
