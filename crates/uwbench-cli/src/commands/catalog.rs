use std::io::Write;

use uwbench_core::config::{load_catalog, resolve_catalog_path};
use uwbench_core::ConfigOverrides;

use crate::cli::{CatalogArgs, OutputFormat};
use crate::error::{CliError, EXIT_SUCCESS};
use crate::output;

/// Lists the catalog a `run` would execute. Needs no warehouse credentials.
pub fn run(
    args: &CatalogArgs,
    format: OutputFormat,
    pretty: bool,
    out: &mut dyn Write,
) -> Result<u8, CliError> {
    let overrides = ConfigOverrides {
        catalog_path: args.catalog.clone(),
        ..ConfigOverrides::default()
    };
    let path = resolve_catalog_path(&overrides, |name| std::env::var(name).ok());
    let catalog = load_catalog(path.as_deref())?;

    match format {
        OutputFormat::Table => output::catalog_table(out, &catalog)?,
        OutputFormat::Json => output::json(out, &catalog, pretty)?,
    }

    Ok(EXIT_SUCCESS)
}
