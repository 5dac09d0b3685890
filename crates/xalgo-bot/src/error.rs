//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Order error: {0}")]
    Order(#[from] xalgo_core::CoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] xalgo_registry::RegistryError),

    #[error("Executor error: {0}")]
    Executor(#[from] xalgo_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] xalgo_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
