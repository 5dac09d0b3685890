//! Market data for order execution.
//!
//! - [`TickerSource`]: live quote handle bound to one contract and side
//! - [`StreamingTicker`]: watch-channel implementation with a bounded quote wait
//! - [`MarketDataHub`]: per-contract fan-out of the latest tick

pub mod error;
pub mod market_state;
pub mod ticker;

pub use error::{FeedError, FeedResult};
pub use market_state::MarketDataHub;
pub use ticker::{BoxFuture, DynTicker, StreamingTicker, TickerSource};
