//! Behavior-driven tests for the benchmark runner
//!
//! These tests drive the runner through stub connections and verify what a
//! user of the harness observes: which queries ran, in which order, what was
//! timed, and that every cursor and connection is released.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use uwbench_core::warehouse::{
    BackendKind, Cursor, QueryOutcome, WarehouseConnection, WarehouseError,
};
use uwbench_core::{
    render_table, BenchmarkResult, BenchmarkRunner, Catalog, Clock, NamedQuery, RunError,
    RunObserver, RunState, Session,
};

// =============================================================================
// Test doubles
// =============================================================================

#[derive(Default)]
struct Ledger {
    cursors_opened: Cell<usize>,
    cursors_released: Cell<usize>,
    connections_closed: Cell<usize>,
    statements: RefCell<Vec<String>>,
}

struct StubWarehouse {
    ledger: Rc<Ledger>,
    fail_on_statement: Option<usize>,
}

impl StubWarehouse {
    fn healthy(ledger: &Rc<Ledger>) -> Self {
        Self {
            ledger: Rc::clone(ledger),
            fail_on_statement: None,
        }
    }

    fn failing_on(ledger: &Rc<Ledger>, statement: usize) -> Self {
        Self {
            ledger: Rc::clone(ledger),
            fail_on_statement: Some(statement),
        }
    }
}

struct StubCursor {
    ledger: Rc<Ledger>,
    fail_on_statement: Option<usize>,
}

impl Cursor for StubCursor {
    fn execute(&mut self, sql: &str) -> Result<QueryOutcome, WarehouseError> {
        let mut statements = self.ledger.statements.borrow_mut();
        statements.push(sql.to_string());
        if self.fail_on_statement == Some(statements.len()) {
            return Err(WarehouseError::QueryFailed {
                code: Some(String::from("001003")),
                sql_state: Some(String::from("42000")),
                message: String::from("SQL compilation error: syntax error"),
                query_id: None,
            });
        }
        Ok(QueryOutcome::default())
    }
}

impl Drop for StubCursor {
    fn drop(&mut self) {
        let released = self.ledger.cursors_released.get();
        self.ledger.cursors_released.set(released + 1);
    }
}

impl WarehouseConnection for StubWarehouse {
    fn kind(&self) -> BackendKind {
        BackendKind::Snowflake
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>, WarehouseError> {
        let opened = self.ledger.cursors_opened.get();
        self.ledger.cursors_opened.set(opened + 1);
        Ok(Box::new(StubCursor {
            ledger: Rc::clone(&self.ledger),
            fail_on_statement: self.fail_on_statement,
        }))
    }

    fn close(self: Box<Self>) -> Result<(), WarehouseError> {
        let closed = self.ledger.connections_closed.get();
        self.ledger.connections_closed.set(closed + 1);
        Ok(())
    }
}

/// Always reports the same instant, so every query takes exactly zero seconds.
struct FrozenClock(Instant);

impl Clock for FrozenClock {
    fn now(&self) -> Instant {
        self.0
    }
}

#[derive(Default)]
struct ProgressLog {
    started: Vec<String>,
    completed: Vec<String>,
}

impl RunObserver for ProgressLog {
    fn query_started(&mut self, label: &str) {
        self.started.push(label.to_string());
    }

    fn query_completed(&mut self, result: &BenchmarkResult) {
        self.completed.push(result.label.clone());
    }
}

fn catalog_of(size: usize) -> Catalog {
    Catalog::new(
        (1..=size)
            .map(|index| NamedQuery::new(format!("Q{index}"), format!("SELECT {index}")))
            .collect(),
    )
    .expect("catalog")
}

// =============================================================================
// Runner: full catalog
// =============================================================================

#[test]
fn when_every_query_succeeds_results_match_catalog_order() {
    for size in [1, 2, 5, 8] {
        // Given: A healthy warehouse and a catalog of `size` queries
        let ledger = Rc::new(Ledger::default());
        let mut warehouse = StubWarehouse::healthy(&ledger);
        let catalog = catalog_of(size);

        // When: The catalog runs
        let results = BenchmarkRunner::new()
            .run(&mut warehouse, &catalog, &mut ())
            .expect("run should succeed");

        // Then: One non-negative result per query, in catalog order
        assert_eq!(results.len(), size);
        assert!(results
            .iter()
            .map(|result| result.label.as_str())
            .eq(catalog.labels()));
        assert!(results.iter().all(|result| result.elapsed_seconds >= 0.0));
        assert_eq!(
            *ledger.statements.borrow(),
            catalog.iter().map(|query| query.sql.clone()).collect::<Vec<_>>()
        );
    }
}

#[test]
fn when_kth_query_fails_only_earlier_results_survive() {
    let size = 5;
    for failing in 1..=size {
        // Given: A warehouse that rejects the k-th statement
        let ledger = Rc::new(Ledger::default());
        let mut warehouse = StubWarehouse::failing_on(&ledger, failing);
        let mut runner = BenchmarkRunner::new();

        // When: The catalog runs
        let error = runner
            .run(&mut warehouse, &catalog_of(size), &mut ())
            .expect_err("run should abort");

        // Then: k-1 results are kept and nothing after k is attempted
        assert_eq!(error.completed().len(), failing - 1);
        assert_eq!(ledger.statements.borrow().len(), failing);
        assert_eq!(runner.state(), RunState::Aborted);
        match error {
            RunError::QueryFailed { label, source, .. } => {
                assert_eq!(label, format!("Q{failing}"));
                assert!(matches!(source, WarehouseError::QueryFailed { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn every_cursor_is_released_whether_its_query_succeeds_or_fails() {
    // Given: A warehouse that fails the third of four statements
    let ledger = Rc::new(Ledger::default());
    let mut warehouse = StubWarehouse::failing_on(&ledger, 3);

    // When: The catalog runs
    let _ = BenchmarkRunner::new().run(&mut warehouse, &catalog_of(4), &mut ());

    // Then: Opens and releases balance, one per attempt
    assert_eq!(ledger.cursors_opened.get(), 3);
    assert_eq!(ledger.cursors_released.get(), 3);
}

#[test]
fn progress_is_reported_only_for_completed_queries() {
    // Given: A warehouse that fails the second statement
    let ledger = Rc::new(Ledger::default());
    let mut warehouse = StubWarehouse::failing_on(&ledger, 2);
    let mut progress = ProgressLog::default();

    // When: The catalog runs with a progress observer
    let _ = BenchmarkRunner::new().run(&mut warehouse, &catalog_of(3), &mut progress);

    // Then: Both attempts started, but only the first completed
    assert_eq!(progress.started, vec!["Q1", "Q2"]);
    assert_eq!(progress.completed, vec!["Q1"]);
}

// =============================================================================
// Session: connection lifetime
// =============================================================================

#[test]
fn connection_is_released_exactly_once_for_any_number_of_successes() {
    for failing in [Some(1), Some(2), None] {
        // Given: A session over a warehouse that may fail mid-catalog
        let ledger = Rc::new(Ledger::default());
        let warehouse = match failing {
            Some(statement) => StubWarehouse::failing_on(&ledger, statement),
            None => StubWarehouse::healthy(&ledger),
        };
        let mut session = Session::from_connection(Box::new(warehouse));

        // When: The catalog runs and the session is closed
        let outcome = BenchmarkRunner::new().run(session.connection(), &catalog_of(2), &mut ());
        session.close().expect("close");

        // Then: The connection was closed exactly once
        assert_eq!(outcome.is_ok(), failing.is_none());
        assert_eq!(ledger.connections_closed.get(), 1);
    }
}

#[test]
fn dropped_session_still_releases_connection() {
    // Given: A session that is abandoned after a failed run
    let ledger = Rc::new(Ledger::default());
    let run = || -> Result<Vec<BenchmarkResult>, RunError> {
        let mut session = Session::from_connection(Box::new(StubWarehouse::failing_on(&ledger, 1)));
        let results = BenchmarkRunner::new().run(session.connection(), &catalog_of(2), &mut ())?;
        session.close().expect("close");
        Ok(results)
    };

    // When: The run bails out through `?`
    assert!(run().is_err());

    // Then: Drop closed the connection once
    assert_eq!(ledger.connections_closed.get(), 1);
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn two_instant_queries_produce_two_zero_second_rows() {
    // Given: Catalog {Q1, Q2} on a warehouse that answers instantly
    let ledger = Rc::new(Ledger::default());
    let mut warehouse = StubWarehouse::healthy(&ledger);
    let catalog = Catalog::new(vec![
        NamedQuery::new("Q1", "<stmt1>"),
        NamedQuery::new("Q2", "<stmt2>"),
    ])
    .expect("catalog");

    // When: The catalog runs on a frozen clock
    let results = BenchmarkRunner::with_clock(FrozenClock(Instant::now()))
        .run(&mut warehouse, &catalog, &mut ())
        .expect("run");

    // Then: Exactly [("Q1", 0.0), ("Q2", 0.0)], rendered as two rows
    assert_eq!(
        results,
        vec![BenchmarkResult::new("Q1", 0.0), BenchmarkResult::new("Q2", 0.0)]
    );

    let table = render_table(&results);
    let rows = table
        .lines()
        .filter(|line| line.contains("0.000000"))
        .collect::<Vec<_>>();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains("Q1"));
    assert!(rows[1].contains("Q2"));
}

#[test]
fn bad_second_statement_keeps_first_result() {
    // Given: Catalog {Q1, Q2} where Q2 is rejected by the warehouse
    let ledger = Rc::new(Ledger::default());
    let catalog = Catalog::new(vec![
        NamedQuery::new("Q1", "<stmt1>"),
        NamedQuery::new("Q2", "<bad-stmt>"),
    ])
    .expect("catalog");
    let mut session = Session::from_connection(Box::new(StubWarehouse::failing_on(&ledger, 2)));
    let mut progress = ProgressLog::default();

    // When: The catalog runs and the session is closed
    let error = BenchmarkRunner::new()
        .run(session.connection(), &catalog, &mut progress)
        .expect_err("Q2 fails");
    session.close().expect("close");

    // Then: Q1 is kept, one progress notice was emitted, the connection closed
    assert_eq!(error.completed().len(), 1);
    assert_eq!(error.completed()[0].label, "Q1");
    assert!(error.completed()[0].elapsed_seconds >= 0.0);
    assert_eq!(progress.completed, vec!["Q1"]);
    assert_eq!(ledger.connections_closed.get(), 1);
    assert!(error.to_string().contains("SQL compilation error"));
}
