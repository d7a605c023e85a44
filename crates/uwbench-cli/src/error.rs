use thiserror::Error;
use uwbench_core::warehouse::WarehouseError;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_CONNECTION_FAILED: u8 = 3;
pub const EXIT_RUN_ABORTED: u8 = 4;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] uwbench_core::ConfigError),

    #[error(transparent)]
    Catalog(#[from] uwbench_core::CatalogError),

    #[error("warehouse connection error: {0}")]
    Connection(#[from] WarehouseError),

    #[error(transparent)]
    Run(#[from] uwbench_core::RunError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Catalog(_) => 2,
            Self::Connection(_) => EXIT_CONNECTION_FAILED,
            Self::Run(_) => EXIT_RUN_ABORTED,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
