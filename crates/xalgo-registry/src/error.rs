//! Registry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No tick size published for {0}")]
    UnknownContract(String),

    #[error("Tick size change detected: {0}")]
    ParamChange(String),

    #[error("Invalid tick size for {contract}: {tick_size}")]
    InvalidTickSize { contract: String, tick_size: String },

    #[error("Invalid contract: {0}")]
    InvalidContract(#[from] xalgo_core::CoreError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
