//! # uwbench Core
//!
//! Times a fixed catalog of underwriting queries against a warehouse.
//!
//! ```rust,no_run
//! use uwbench_core::{BenchConfig, BenchmarkRunner, ConfigOverrides, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BenchConfig::from_env(&ConfigOverrides::default())?;
//!     let catalog = config.load_catalog()?;
//!
//!     let mut session = Session::open(&config.backend)?;
//!     let results = BenchmarkRunner::new().run(session.connection(), &catalog, &mut ())?;
//!     session.close()?;
//!
//!     println!("{}", uwbench_core::render_table(&results));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod session;

pub use catalog::{Catalog, NamedQuery};
pub use config::{BenchConfig, ConfigOverrides};
pub use error::{CatalogError, ConfigError, RunError};
pub use report::{format_seconds, render_table, RunReport};
pub use runner::{
    time_query, BenchmarkResult, BenchmarkRunner, Clock, MonotonicClock, RunObserver, RunState,
};
pub use session::Session;
pub use uwbench_warehouse as warehouse;
