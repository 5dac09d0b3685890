//! Monitored order handle.
//!
//! Bundles everything needed to supervise one submitted order: the broker
//! order as sent, the broker-side control, the ticker used to price it, and
//! the management state (status, cancel flags, re-price count).

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use xalgo_core::{BrokerOrder, OrderState, OrderStatusReport};
use xalgo_feed::DynTicker;

use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynOrderControl;

/// A submitted broker order under supervision.
///
/// Created by the gateway on a successful submission, updated by the
/// algorithm's management steps and released once terminal.
#[derive(Debug)]
pub struct MonitoredOrder {
    order: BrokerOrder,
    control: DynOrderControl,
    ticker: Option<DynTicker>,
    submitted_at: Instant,
    submitted_time: DateTime<Utc>,
    last_status: OrderStatusReport,
    cancel_requested: bool,
    cancel_sent: bool,
    reprice_count: u32,
}

impl MonitoredOrder {
    /// Wrap an accepted broker order. The status starts as reported by
    /// the control.
    pub fn new(order: BrokerOrder, control: DynOrderControl) -> Self {
        let last_status = control.status();
        Self {
            order,
            control,
            ticker: None,
            submitted_at: Instant::now(),
            submitted_time: Utc::now(),
            last_status,
            cancel_requested: false,
            cancel_sent: false,
            reprice_count: 0,
        }
    }

    /// Broker order currently working.
    pub fn order(&self) -> &BrokerOrder {
        &self.order
    }

    pub fn control(&self) -> &DynOrderControl {
        &self.control
    }

    pub fn broker_order_id(&self) -> &str {
        self.control.broker_order_id()
    }

    /// Attach the ticker that priced this order.
    ///
    /// A handle owns at most one ticker; a second attach fails and keeps
    /// the first.
    pub fn attach_ticker(&mut self, ticker: DynTicker) -> ExecutorResult<()> {
        if self.ticker.is_some() {
            return Err(ExecutorError::TickerAlreadyAttached(
                self.order.client_order_id().to_string(),
            ));
        }
        self.ticker = Some(ticker);
        Ok(())
    }

    pub fn ticker(&self) -> Option<&DynTicker> {
        self.ticker.as_ref()
    }

    /// Re-read the broker-side status.
    pub fn refresh(&mut self) -> OrderStatusReport {
        let status = self.control.status();
        if status.state != self.last_status.state {
            debug!(
                client_order_id = %self.order.client_order_id(),
                broker_order_id = %self.broker_order_id(),
                from = self.last_status.state.as_str(),
                to = status.state.as_str(),
                "Order state changed"
            );
        }
        self.last_status = status;
        status
    }

    /// Status from the last refresh.
    pub fn status(&self) -> OrderStatusReport {
        self.last_status
    }

    pub fn state(&self) -> OrderState {
        self.last_status.state
    }

    pub fn is_terminal(&self) -> bool {
        self.last_status.is_terminal()
    }

    /// Ask the managing algorithm to cancel at its next step.
    pub fn request_cancel(&mut self) {
        self.cancel_requested = true;
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// Record that a cancel was accepted by the broker.
    pub fn mark_cancel_sent(&mut self) {
        self.cancel_sent = true;
    }

    pub fn cancel_sent(&self) -> bool {
        self.cancel_sent
    }

    /// Swap in the replacement order after an accepted cancel/replace.
    pub fn replace_broker_order(&mut self, replacement: BrokerOrder) {
        self.order = replacement;
        self.reprice_count += 1;
    }

    pub fn reprice_count(&self) -> u32 {
        self.reprice_count
    }

    /// Time since submission.
    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    pub fn submitted_time(&self) -> DateTime<Utc> {
        self.submitted_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOrderControl;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tokio::sync::watch;
    use xalgo_core::{
        BenchmarkPrices, BrokerIdentity, BrokerOrderType, ContractOrder, FuturesContract, OrderSide,
        Price, Quantity,
    };
    use xalgo_feed::StreamingTicker;

    fn broker_order() -> BrokerOrder {
        let contract = FuturesContract::new("GOLD", "20241200").unwrap();
        let order = ContractOrder::new(7, "trend", contract, Quantity::from(2)).unwrap();
        BrokerOrder::from_contract_order(
            &order,
            BrokerOrderType::Limit,
            BenchmarkPrices::default(),
            Some(Price::new(dec!(2400.1))),
            BrokerIdentity::new("paper", "DU1", 1),
        )
    }

    fn ticker() -> DynTicker {
        let (_tx, rx) = watch::channel(None);
        let contract = FuturesContract::new("GOLD", "20241200").unwrap();
        Arc::new(StreamingTicker::new(contract, OrderSide::Buy, rx))
    }

    #[test]
    fn test_ticker_attached_at_most_once() {
        let control = Arc::new(MockOrderControl::new("1", OrderState::Open));
        let mut handle = MonitoredOrder::new(broker_order(), control);

        let first = ticker();
        handle.attach_ticker(Arc::clone(&first)).unwrap();
        let err = handle.attach_ticker(ticker()).unwrap_err();

        assert!(matches!(err, ExecutorError::TickerAlreadyAttached(_)));
        assert!(Arc::ptr_eq(handle.ticker().unwrap(), &first));
    }

    #[test]
    fn test_refresh_tracks_control_state() {
        let control = Arc::new(MockOrderControl::new("1", OrderState::Open));
        let mut handle = MonitoredOrder::new(broker_order(), control.clone());
        assert_eq!(handle.state(), OrderState::Open);

        control.set_state(OrderState::Filled);
        assert_eq!(handle.state(), OrderState::Open);
        handle.refresh();
        assert!(handle.is_terminal());
    }

    #[test]
    fn test_replace_counts_reprices() {
        let control = Arc::new(MockOrderControl::new("1", OrderState::Open));
        let mut handle = MonitoredOrder::new(broker_order(), control);
        let original = handle.order().client_order_id().clone();

        let replacement = handle.order().with_new_limit_price(Price::new(dec!(2400.3)));
        handle.replace_broker_order(replacement);

        assert_eq!(handle.reprice_count(), 1);
        assert_ne!(handle.order().client_order_id(), &original);
        assert_eq!(handle.order().limit_price(), Some(Price::new(dec!(2400.3))));
    }
}
