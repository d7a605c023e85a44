//! CLI argument definitions for uwbench.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Time every catalog query (default) |
//! | `catalog` | Print the active query catalog |
//!
//! # Examples
//!
//! ```bash
//! # Benchmark the built-in underwriting catalog on Snowflake
//! SNOWFLAKE_ACCOUNT=xy12345 SNOWFLAKE_USER=bench SNOWFLAKE_PASSWORD=... uwbench
//!
//! # Benchmark a catalog file against a local DuckDB database
//! uwbench run --backend duckdb --duckdb-path insurance.duckdb --catalog queries.json
//!
//! # Machine-readable report
//! uwbench run --format json --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Underwriting query benchmark harness.
#[derive(Debug, Parser)]
#[command(
    name = "uwbench",
    author,
    version,
    about = "Time a fixed catalog of underwriting queries against a data warehouse",
    long_about = "uwbench connects to a warehouse, runs each query of an ordered catalog \
once, in order, and reports the wall-clock execution time of each.\n\
\n\
Connection settings come from the environment (SNOWFLAKE_ACCOUNT, SNOWFLAKE_USER, \
SNOWFLAKE_PASSWORD, SNOWFLAKE_WAREHOUSE, SNOWFLAKE_DATABASE, SNOWFLAKE_SCHEMA, \
SNOWFLAKE_ROLE, UWBENCH_BACKEND, UWBENCH_CATALOG, UWBENCH_DUCKDB_PATH); flags win over \
variables."
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - table: progress notices and a grid table (default)
    /// - json: a single run report document
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Grid table for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

/// Warehouse backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendSelector {
    /// Snowflake account from SNOWFLAKE_* variables.
    Snowflake,
    /// Embedded DuckDB database.
    Duckdb,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every catalog query once, in order, and time it.
    ///
    /// The first failing query stops the run; results gathered before it
    /// are still printed.
    ///
    /// # Examples
    ///
    ///   uwbench run
    ///   uwbench run --backend duckdb --duckdb-path insurance.duckdb --catalog queries.json
    Run(RunArgs),

    /// Print the labels and statements of the active catalog.
    Catalog(CatalogArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Warehouse backend (overrides UWBENCH_BACKEND).
    #[arg(long, value_enum)]
    pub backend: Option<BackendSelector>,

    /// JSON catalog file (overrides UWBENCH_CATALOG).
    ///
    /// Format: {"queries": [{"label": "...", "sql": "..."}]}
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// DuckDB database file (overrides UWBENCH_DUCKDB_PATH).
    #[arg(long)]
    pub duckdb_path: Option<PathBuf>,

    /// Open the DuckDB database file read-only.
    #[arg(long, default_value_t = false)]
    pub read_only: bool,
}

/// Arguments for the `catalog` command.
#[derive(Debug, Clone, Default, Args)]
pub struct CatalogArgs {
    /// JSON catalog file (overrides UWBENCH_CATALOG).
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}
