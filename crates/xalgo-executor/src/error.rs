//! Executor error types.
//!
//! Only caller or configuration defects surface as errors. Recoverable
//! conditions (no market data, broker rejection) are reported through
//! [`crate::SubmissionOutcome::NoOrder`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid pricing configuration: {0}")]
    InvalidPricingConfiguration(String),

    #[error("Unknown execution algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Ticker already attached to order {0}")]
    TickerAlreadyAttached(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
