//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// No two-sided quote arrived in time, or the publisher went away first.
    #[error("No market data for {contract} after {waited_ms}ms")]
    NoMarketData { contract: String, waited_ms: u64 },
}

pub type FeedResult<T> = Result<T, FeedError>;
