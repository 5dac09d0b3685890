//! Shared submission procedure.
//!
//! Every algorithm submits through [`OrderSubmitter::submit`]:
//!
//! 0. Limit / stop-loss priced from the input source without a price -> `Err`
//! 1. Resolve broker identity (an explicit account overrides the default)
//! 2. Obtain a ticker unless the caller brought one
//! 3. Wait, bounded, for a two-sided quote -> `NoOrder(NoMarketData)` on timeout
//! 4. Snapshot benchmark prices and mark the quote as the reference tick
//! 5. Limit / stop-loss: resolve and round the limit price
//! 6. Build the broker order
//! 7. Submit -> `NoOrder(SubmissionRejected)` if the broker refuses
//! 8. Attach the ticker to the returned handle

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use xalgo_core::{BenchmarkPrices, BrokerOrder, BrokerOrderType, ContractOrder, Price};
use xalgo_feed::{DynTicker, FeedError};
use xalgo_telemetry::Metrics;

use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynBrokerGateway;
use crate::handle::MonitoredOrder;
use crate::pricing::{LimitPriceResolver, LimitPriceSource};

/// Why a submission attempt ended without a live order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOrderReason {
    /// No two-sided quote arrived within the wait.
    NoMarketData,
    /// The broker refused or could not take the order.
    SubmissionRejected(String),
}

impl NoOrderReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMarketData => "no_market_data",
            Self::SubmissionRejected(_) => "submission_rejected",
        }
    }
}

impl fmt::Display for NoOrderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMarketData => write!(f, "no market data"),
            Self::SubmissionRejected(reason) => write!(f, "submission rejected: {reason}"),
        }
    }
}

/// Result of a submission attempt.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Live order, ready for management.
    Submitted(MonitoredOrder),
    /// Nothing was placed.
    NoOrder(NoOrderReason),
}

impl SubmissionOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }

    pub fn into_order(self) -> Option<MonitoredOrder> {
        match self {
            Self::Submitted(order) => Some(order),
            Self::NoOrder(_) => None,
        }
    }

    pub fn no_order_reason(&self) -> Option<&NoOrderReason> {
        match self {
            Self::Submitted(_) => None,
            Self::NoOrder(reason) => Some(reason),
        }
    }
}

/// Parameters of one submission attempt.
#[derive(Debug)]
pub struct SubmissionRequest<'a> {
    pub contract_order: &'a ContractOrder,
    pub input_limit_price: Option<Price>,
    pub order_type: BrokerOrderType,
    pub limit_price_source: LimitPriceSource,
    /// Ticker to reuse instead of asking the gateway for a new one.
    pub ticker: Option<DynTicker>,
    /// Account overriding the gateway default.
    pub broker_account: Option<String>,
}

impl<'a> SubmissionRequest<'a> {
    /// Market order, priced from the input source, default routing.
    pub fn new(contract_order: &'a ContractOrder) -> Self {
        Self {
            contract_order,
            input_limit_price: None,
            order_type: BrokerOrderType::Market,
            limit_price_source: LimitPriceSource::Input,
            ticker: None,
            broker_account: None,
        }
    }

    #[must_use]
    pub fn with_order_type(mut self, order_type: BrokerOrderType) -> Self {
        self.order_type = order_type;
        self
    }

    #[must_use]
    pub fn with_limit_price_source(mut self, source: LimitPriceSource) -> Self {
        self.limit_price_source = source;
        self
    }

    #[must_use]
    pub fn with_input_limit_price(mut self, price: Option<Price>) -> Self {
        self.input_limit_price = price;
        self
    }

    #[must_use]
    pub fn with_ticker(mut self, ticker: DynTicker) -> Self {
        self.ticker = Some(ticker);
        self
    }

    #[must_use]
    pub fn with_broker_account(mut self, account: Option<String>) -> Self {
        self.broker_account = account;
        self
    }

    /// Reject a priced order type that asks for the input price without
    /// carrying one. No market data can fix this.
    pub fn check_pricing(&self) -> ExecutorResult<()> {
        if self.order_type.requires_limit_price()
            && self.limit_price_source == LimitPriceSource::Input
            && self.input_limit_price.is_none()
        {
            return Err(ExecutorError::InvalidPricingConfiguration(format!(
                "{} order {} priced from input source has no limit price",
                self.order_type,
                self.contract_order.order_id()
            )));
        }
        Ok(())
    }
}

/// Prices and submits broker orders for contract orders.
#[derive(Clone)]
pub struct OrderSubmitter {
    gateway: DynBrokerGateway,
    resolver: LimitPriceResolver,
    quote_wait_timeout: Duration,
}

impl OrderSubmitter {
    pub fn new(gateway: DynBrokerGateway, quote_wait_timeout: Duration) -> Self {
        let resolver = LimitPriceResolver::new(gateway.clone());
        Self {
            gateway,
            resolver,
            quote_wait_timeout,
        }
    }

    pub fn quote_wait_timeout(&self) -> Duration {
        self.quote_wait_timeout
    }

    /// Run the submission procedure for one request.
    ///
    /// Recoverable failures come back as `Ok(NoOrder)`; configuration
    /// defects as `Err`.
    pub async fn submit(&self, request: SubmissionRequest<'_>) -> ExecutorResult<SubmissionOutcome> {
        let order = request.contract_order;
        request.check_pricing()?;

        let mut identity = self.gateway.identity();
        if let Some(account) = request.broker_account {
            identity = identity.with_account(account);
        }

        let ticker = match request.ticker {
            Some(ticker) => ticker,
            None => self.gateway.ticker_for(order),
        };

        let benchmarks = match self.collect_benchmarks(order, &ticker).await {
            Ok(benchmarks) => benchmarks,
            Err(e) => {
                warn!(
                    instrument = %order.instrument_code(),
                    contract = %order.contract(),
                    order_id = order.order_id(),
                    strategy = %order.strategy_name(),
                    attrs = ?order.log_attributes(),
                    error = %e,
                    "Can't get market data, not trading order {}",
                    order
                );
                let reason = NoOrderReason::NoMarketData;
                Metrics::order_not_submitted(reason.as_str());
                return Ok(SubmissionOutcome::NoOrder(reason));
            }
        };

        let limit_price = if request.order_type.requires_limit_price() {
            Some(self.resolver.limit_price_for(
                order,
                request.limit_price_source,
                &benchmarks,
                request.input_limit_price,
            )?)
        } else {
            None
        };

        let broker_order = BrokerOrder::from_contract_order(
            order,
            request.order_type,
            benchmarks,
            limit_price,
            identity,
        );
        debug!(
            instrument = %order.instrument_code(),
            order_id = order.order_id(),
            attrs = ?order.log_attributes(),
            "Created broker order {} (not yet submitted)",
            broker_order
        );

        let order_type = broker_order.order_type();
        match self.gateway.submit(broker_order).await {
            SubmissionOutcome::Submitted(mut placed) => {
                if let Err(e) = placed.attach_ticker(ticker) {
                    error!(
                        instrument = %order.instrument_code(),
                        order_id = order.order_id(),
                        broker_order_id = %placed.broker_order_id(),
                        client_order_id = %placed.order().client_order_id(),
                        error = %e,
                        "Live order can't be monitored, cancelling {}",
                        placed.order()
                    );
                    if !self.gateway.cancel(&placed).await {
                        error!(
                            broker_order_id = %placed.broker_order_id(),
                            "Cancel refused, order left working at broker"
                        );
                    }
                    return Err(e);
                }
                info!(
                    instrument = %order.instrument_code(),
                    order_id = order.order_id(),
                    broker_order_id = %placed.broker_order_id(),
                    "Submitted broker order {}",
                    placed.order()
                );
                Metrics::order_submitted(order.instrument_code(), &order_type.to_string());
                Ok(SubmissionOutcome::Submitted(placed))
            }
            SubmissionOutcome::NoOrder(reason) => {
                warn!(
                    instrument = %order.instrument_code(),
                    contract = %order.contract(),
                    order_id = order.order_id(),
                    strategy = %order.strategy_name(),
                    attrs = ?order.log_attributes(),
                    %reason,
                    "Order could not be submitted"
                );
                Metrics::order_not_submitted(reason.as_str());
                Ok(SubmissionOutcome::NoOrder(reason))
            }
        }
    }

    /// Wait for a reference quote and snapshot its benchmark prices.
    async fn collect_benchmarks(
        &self,
        order: &ContractOrder,
        ticker: &DynTicker,
    ) -> Result<BenchmarkPrices, FeedError> {
        let started = Instant::now();
        let waited = ticker.wait_for_valid_quote(self.quote_wait_timeout).await;
        Metrics::quote_wait(
            order.instrument_code(),
            started.elapsed().as_secs_f64() * 1000.0,
        );
        let reference = waited?;

        let benchmarks = ticker.analyse(&reference).benchmarks();
        ticker.set_reference(reference);
        Ok(benchmarks)
    }
}
