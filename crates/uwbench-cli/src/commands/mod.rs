mod catalog;
mod run;

use std::io::Write;

use uwbench_core::warehouse::BackendKind;

use crate::cli::{BackendSelector, Cli, Command, RunArgs};
use crate::error::CliError;

pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<u8, CliError> {
    match &cli.command {
        None => run::run(&RunArgs::default(), cli.format, cli.pretty, out),
        Some(Command::Run(args)) => run::run(args, cli.format, cli.pretty, out),
        Some(Command::Catalog(args)) => catalog::run(args, cli.format, cli.pretty, out),
    }
}

fn to_backend_kind(selector: BackendSelector) -> BackendKind {
    match selector {
        BackendSelector::Snowflake => BackendKind::Snowflake,
        BackendSelector::Duckdb => BackendKind::DuckDb,
    }
}
