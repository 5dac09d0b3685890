//! Execution algorithms.
//!
//! An algorithm turns one contract order into a live broker order
//! ([`ExecutionAlgorithm::submit_trade`]) and then supervises it one step
//! at a time ([`ExecutionAlgorithm::manage_trade`]) until it is terminal.
//!
//! Variants:
//! - [`MarketAlgo`]: market order, cancelled if it is still working after a timeout
//! - [`BestLimitAlgo`]: passive limit that turns aggressive on time or adverse move
//! - [`InputLimitAlgo`]: limit at the caller's price, fire-and-forget

pub mod best_limit;
pub mod input_limit;
pub mod market;
pub mod submission;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use xalgo_core::ContractOrder;
use xalgo_feed::BoxFuture;

use crate::config::ExecutionConfig;
use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynBrokerGateway;
use crate::handle::MonitoredOrder;
use crate::pricing::LimitPriceResolver;

pub use best_limit::BestLimitAlgo;
pub use input_limit::InputLimitAlgo;
pub use market::MarketAlgo;
pub use submission::{NoOrderReason, OrderSubmitter, SubmissionOutcome, SubmissionRequest};

/// Available algorithm variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgoKind {
    Market,
    BestLimit,
    InputLimit,
}

impl AlgoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::BestLimit => "best_limit",
            Self::InputLimit => "input_limit",
        }
    }
}

impl fmt::Display for AlgoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgoKind {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(Self::Market),
            "best_limit" => Ok(Self::BestLimit),
            "input_limit" => Ok(Self::InputLimit),
            other => Err(ExecutorError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Protocol shared by all execution algorithms.
///
/// One instance handles exactly one contract order. Calls are strictly
/// sequential: `submit_trade` once, then `manage_trade` repeatedly.
pub trait ExecutionAlgorithm: Send {
    fn kind(&self) -> AlgoKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Order being executed.
    fn contract_order(&self) -> &ContractOrder;

    /// Whether the owner must keep calling `manage_trade` after submission.
    fn requires_active_management(&self) -> bool {
        true
    }

    /// Price and submit the broker order.
    ///
    /// `Ok(NoOrder)` when there was no market data or the broker refused;
    /// `Err` only for caller or configuration defects.
    fn submit_trade(&mut self) -> BoxFuture<'_, ExecutorResult<SubmissionOutcome>>;

    /// One management step. Always hands the order back, updated.
    fn manage_trade(&mut self, order: MonitoredOrder) -> BoxFuture<'_, MonitoredOrder>;
}

/// Collaborators shared by every algorithm instance.
#[derive(Clone)]
pub struct AlgoContext {
    gateway: DynBrokerGateway,
    config: Arc<ExecutionConfig>,
    resolver: LimitPriceResolver,
    submitter: OrderSubmitter,
}

impl AlgoContext {
    pub fn new(gateway: DynBrokerGateway, config: Arc<ExecutionConfig>) -> Self {
        let resolver = LimitPriceResolver::new(Arc::clone(&gateway));
        let submitter = OrderSubmitter::new(Arc::clone(&gateway), config.quote_wait_timeout());
        Self {
            gateway,
            config,
            resolver,
            submitter,
        }
    }

    pub fn gateway(&self) -> &DynBrokerGateway {
        &self.gateway
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LimitPriceResolver {
        &self.resolver
    }

    pub fn submitter(&self) -> &OrderSubmitter {
        &self.submitter
    }

    /// Broker account override from configuration.
    pub fn broker_account(&self) -> Option<String> {
        self.config.broker_account.clone()
    }
}

/// Chooses the algorithm for a contract order.
///
/// Precedence: the order's own preference, then the per-instrument
/// configuration, then the default.
#[derive(Debug, Clone)]
pub struct AlgoSelector {
    default_algo: AlgoKind,
    instrument_algos: HashMap<String, AlgoKind>,
}

impl AlgoSelector {
    pub fn new(default_algo: AlgoKind) -> Self {
        Self {
            default_algo,
            instrument_algos: HashMap::new(),
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> ExecutorResult<Self> {
        let mut selector = Self::new(config.default_algo.parse()?);
        for (instrument, algo) in &config.instrument_algos {
            selector
                .instrument_algos
                .insert(instrument.clone(), algo.parse()?);
        }
        Ok(selector)
    }

    #[must_use]
    pub fn with_instrument(mut self, instrument: impl Into<String>, algo: AlgoKind) -> Self {
        self.instrument_algos.insert(instrument.into(), algo);
        self
    }

    pub fn select(&self, order: &ContractOrder) -> ExecutorResult<AlgoKind> {
        if let Some(preferred) = order.algo_to_use() {
            return preferred.parse();
        }
        Ok(self
            .instrument_algos
            .get(order.instrument_code())
            .copied()
            .unwrap_or(self.default_algo))
    }
}

/// Instantiate an algorithm for one contract order.
pub fn build_algo(
    kind: AlgoKind,
    ctx: &AlgoContext,
    order: ContractOrder,
) -> ExecutorResult<Box<dyn ExecutionAlgorithm>> {
    Ok(match kind {
        AlgoKind::Market => Box::new(MarketAlgo::new(ctx.clone(), order)),
        AlgoKind::BestLimit => Box::new(BestLimitAlgo::new(ctx.clone(), order)),
        AlgoKind::InputLimit => Box::new(InputLimitAlgo::new(ctx.clone(), order)?),
    })
}

/// Send a cancel unless one was already accepted.
pub(crate) async fn send_cancel(
    gateway: &DynBrokerGateway,
    order: &mut MonitoredOrder,
    algo: &'static str,
    reason: &str,
) {
    if order.cancel_sent() {
        return;
    }
    if gateway.cancel(order).await {
        info!(
            algo,
            reason,
            client_order_id = %order.order().client_order_id(),
            broker_order_id = %order.broker_order_id(),
            instrument = %order.order().instrument_code(),
            "Cancel sent"
        );
        order.mark_cancel_sent();
    } else {
        warn!(
            algo,
            reason,
            client_order_id = %order.order().client_order_id(),
            broker_order_id = %order.broker_order_id(),
            instrument = %order.order().instrument_code(),
            "Cancel refused by broker, will retry"
        );
    }
}
