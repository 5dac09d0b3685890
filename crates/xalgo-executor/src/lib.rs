//! Order execution for futures contract orders.
//!
//! Turns a contract order into a priced broker order, submits it and
//! supervises it until it reaches a terminal state.
//!
//! # Key Components
//!
//! - [`BrokerGateway`]: broker connection (identity, tick sizes, tickers, order entry)
//! - [`MonitoredOrder`]: submitted order + broker control + ticker + management state
//! - [`LimitPriceResolver`]: limit price source selection and tick rounding
//! - [`OrderSubmitter`]: shared submission procedure
//! - [`ExecutionAlgorithm`]: submit/manage protocol with market, best-limit and input-limit variants
//! - [`ExecutionEngine`]: per-order scheduling and the management loop
//!
//! # Failure Handling
//!
//! 1. No quote within the wait -> `NoOrder(NoMarketData)`
//! 2. Broker refuses the order -> `NoOrder(SubmissionRejected)`
//! 3. Unknown tick size -> limit price sent unrounded (warning + metric)
//! 4. Missing price for the configured source -> `Err(InvalidPricingConfiguration)`

pub mod algo;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod mock;
pub mod pricing;

pub use algo::{
    build_algo, AlgoContext, AlgoKind, AlgoSelector, BestLimitAlgo, ExecutionAlgorithm,
    InputLimitAlgo, MarketAlgo, NoOrderReason, OrderSubmitter, SubmissionOutcome,
    SubmissionRequest,
};
pub use config::ExecutionConfig;
pub use engine::{ExecutionEngine, ExecutionReport, ExecutionResult};
pub use error::{ExecutorError, ExecutorResult};
pub use gateway::{BrokerGateway, DynBrokerGateway, DynOrderControl, OrderControl};
pub use handle::MonitoredOrder;
pub use mock::{MockBrokerGateway, MockOrderControl, MockSubmitResult};
pub use pricing::{resolve_limit_price, round_to_tick, LimitPriceResolver, LimitPriceSource};

// Re-exported for implementors of `BrokerGateway`.
pub use xalgo_feed::BoxFuture;
