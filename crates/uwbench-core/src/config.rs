//! Run configuration from CLI overrides and environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `UWBENCH_BACKEND` | `snowflake` |
//! | `UWBENCH_CATALOG` | built-in underwriting catalog |
//! | `UWBENCH_DUCKDB_PATH` | in-memory database |
//! | `SNOWFLAKE_ACCOUNT`, `SNOWFLAKE_USER`, `SNOWFLAKE_PASSWORD` | required |
//! | `SNOWFLAKE_WAREHOUSE` | `policy_data_warehouse` |
//! | `SNOWFLAKE_DATABASE` | `insurance_db` |
//! | `SNOWFLAKE_SCHEMA` | `public` |
//! | `SNOWFLAKE_ROLE`, `SNOWFLAKE_HOST` | unset |

use std::env;
use std::path::{Path, PathBuf};

use uwbench_warehouse::{AccessMode, BackendConfig, BackendKind, DuckDbConfig, SnowflakeConfig};

use crate::catalog::Catalog;
use crate::error::{CatalogError, ConfigError};

pub const DEFAULT_WAREHOUSE: &str = "policy_data_warehouse";
pub const DEFAULT_DATABASE: &str = "insurance_db";
pub const DEFAULT_SCHEMA: &str = "public";

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub backend: Option<BackendKind>,
    pub catalog_path: Option<PathBuf>,
    pub duckdb_path: Option<PathBuf>,
    pub read_only: bool,
}

/// Everything a benchmark run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub backend: BackendConfig,
    /// `None` selects [`Catalog::underwriting`].
    pub catalog_path: Option<PathBuf>,
}

impl BenchConfig {
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |name| env::var(name).ok())
    }

    /// Resolve against an arbitrary variable lookup. Blank values count as unset.
    pub fn resolve<F>(overrides: &ConfigOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let kind = match overrides.backend {
            Some(kind) => kind,
            None => match var("UWBENCH_BACKEND") {
                Some(value) => {
                    BackendKind::parse(&value).ok_or(ConfigError::UnknownBackend { value })?
                }
                None => BackendKind::Snowflake,
            },
        };

        let backend = match kind {
            BackendKind::Snowflake => {
                let required = |name: &'static str| var(name).ok_or(ConfigError::MissingVar { name });
                BackendConfig::Snowflake(SnowflakeConfig {
                    account: required("SNOWFLAKE_ACCOUNT")?,
                    user: required("SNOWFLAKE_USER")?,
                    password: required("SNOWFLAKE_PASSWORD")?,
                    warehouse: var("SNOWFLAKE_WAREHOUSE")
                        .unwrap_or_else(|| DEFAULT_WAREHOUSE.to_string()),
                    database: var("SNOWFLAKE_DATABASE")
                        .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                    schema: var("SNOWFLAKE_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
                    role: var("SNOWFLAKE_ROLE"),
                    host: var("SNOWFLAKE_HOST"),
                })
            }
            BackendKind::DuckDb => BackendConfig::DuckDb(DuckDbConfig {
                db_path: overrides
                    .duckdb_path
                    .clone()
                    .or_else(|| var("UWBENCH_DUCKDB_PATH").map(PathBuf::from)),
                access_mode: if overrides.read_only {
                    AccessMode::ReadOnly
                } else {
                    AccessMode::ReadWrite
                },
            }),
        };

        Ok(Self {
            backend,
            catalog_path: resolve_catalog_path(overrides, &lookup),
        })
    }

    /// Load the configured catalog file, or the built-in one.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        load_catalog(self.catalog_path.as_deref())
    }
}

/// Catalog file from the overrides or `UWBENCH_CATALOG`; backend settings are not read.
pub fn resolve_catalog_path<F>(overrides: &ConfigOverrides, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    overrides.catalog_path.clone().or_else(|| {
        lookup("UWBENCH_CATALOG")
            .filter(|value| !value.trim().is_empty())
            .map(|value| PathBuf::from(value.trim()))
    })
}

pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match path {
        Some(path) => Catalog::from_path(path),
        None => Ok(Catalog::underwriting()),
    }
}
