//! In-memory broker for tests.
//!
//! Records every call so tests can assert on what the algorithms sent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use xalgo_core::{
    BrokerIdentity, BrokerOrder, ContractOrder, FuturesContract, OrderState, OrderStatusReport,
    Price, Quantity, Tick,
};
use xalgo_feed::{BoxFuture, DynTicker, MarketDataHub};
use xalgo_registry::{RegistryResult, TickSizeCache};

use crate::algo::submission::{NoOrderReason, SubmissionOutcome};
use crate::gateway::{BrokerGateway, OrderControl};
use crate::handle::MonitoredOrder;

/// Broker-side order with a settable status.
#[derive(Debug)]
pub struct MockOrderControl {
    broker_order_id: String,
    status: Mutex<OrderStatusReport>,
}

impl MockOrderControl {
    pub fn new(broker_order_id: impl Into<String>, state: OrderState) -> Self {
        Self {
            broker_order_id: broker_order_id.into(),
            status: Mutex::new(OrderStatusReport {
                state,
                ..OrderStatusReport::pending()
            }),
        }
    }

    pub fn set_state(&self, state: OrderState) {
        self.status.lock().state = state;
    }

    /// Mark the order completely filled.
    pub fn fill(&self, quantity: Quantity, price: Price) {
        *self.status.lock() = OrderStatusReport {
            state: OrderState::Filled,
            filled_quantity: quantity,
            average_fill_price: Some(price),
        };
    }
}

impl OrderControl for MockOrderControl {
    fn broker_order_id(&self) -> &str {
        &self.broker_order_id
    }

    fn status(&self) -> OrderStatusReport {
        *self.status.lock()
    }
}

/// What the next `submit` call does.
#[derive(Debug, Clone)]
pub enum MockSubmitResult {
    /// Accept and create a control in this state.
    Accept(OrderState),
    /// Reject with a reason.
    Reject(String),
}

/// Mock broker gateway for testing.
pub struct MockBrokerGateway {
    identity: Mutex<BrokerIdentity>,
    tick_sizes: TickSizeCache,
    hub: MarketDataHub,
    next_result: Mutex<MockSubmitResult>,
    accept_cancel: AtomicBool,
    accept_modify: AtomicBool,
    attach_on_submit: AtomicBool,
    next_id: AtomicU64,
    /// Recorded calls for verification.
    submits: Mutex<Vec<BrokerOrder>>,
    tickers: Mutex<Vec<DynTicker>>,
    controls: Mutex<Vec<Arc<MockOrderControl>>>,
    cancels: Mutex<Vec<String>>,
    modifications: Mutex<Vec<BrokerOrder>>,
}

impl Default for MockBrokerGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrokerGateway {
    /// Create a mock that accepts everything and knows no tick sizes.
    pub fn new() -> Self {
        Self {
            identity: Mutex::new(BrokerIdentity::new("mock", "MOCK-ACCT", 1)),
            tick_sizes: TickSizeCache::new(),
            hub: MarketDataHub::new(),
            next_result: Mutex::new(MockSubmitResult::Accept(OrderState::Open)),
            accept_cancel: AtomicBool::new(true),
            accept_modify: AtomicBool::new(true),
            attach_on_submit: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            submits: Mutex::new(Vec::new()),
            tickers: Mutex::new(Vec::new()),
            controls: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            modifications: Mutex::new(Vec::new()),
        }
    }

    pub fn set_identity(&self, identity: BrokerIdentity) {
        *self.identity.lock() = identity;
    }

    /// Publish a tick size for a contract, replacing any previous one.
    pub fn set_tick_size(&self, contract: &FuturesContract, tick_size: Price) {
        self.tick_sizes.remove(contract);
        if let Err(e) = self.tick_sizes.update(contract.clone(), tick_size) {
            tracing::warn!(error = %e, "Mock tick size rejected");
        }
    }

    /// Publish a quote.
    pub fn publish(&self, contract: &FuturesContract, tick: Tick) {
        self.hub.publish(contract, tick);
    }

    pub fn hub(&self) -> &MarketDataHub {
        &self.hub
    }

    /// Set the result of the next submissions.
    pub fn set_next_result(&self, result: MockSubmitResult) {
        *self.next_result.lock() = result;
    }

    pub fn set_accept_cancel(&self, accept: bool) {
        self.accept_cancel.store(accept, Ordering::SeqCst);
    }

    pub fn set_accept_modify(&self, accept: bool) {
        self.accept_modify.store(accept, Ordering::SeqCst);
    }

    /// Hand back accepted orders with a ticker of the gateway's own
    /// already attached.
    pub fn set_attach_on_submit(&self, attach: bool) {
        self.attach_on_submit.store(attach, Ordering::SeqCst);
    }

    /// Get recorded submissions.
    pub fn get_submits(&self) -> Vec<BrokerOrder> {
        self.submits.lock().clone()
    }

    /// Tickers handed out by `ticker_for`.
    pub fn get_tickers(&self) -> Vec<DynTicker> {
        self.tickers.lock().clone()
    }

    /// Broker order ids of accepted or refused cancels.
    pub fn get_cancels(&self) -> Vec<String> {
        self.cancels.lock().clone()
    }

    /// Replacement orders sent through `modify_limit_price`.
    pub fn get_modifications(&self) -> Vec<BrokerOrder> {
        self.modifications.lock().clone()
    }

    /// Control of the most recently accepted order.
    pub fn last_control(&self) -> Option<Arc<MockOrderControl>> {
        self.controls.lock().last().cloned()
    }

    fn control(&self, broker_order_id: &str) -> Option<Arc<MockOrderControl>> {
        self.controls
            .lock()
            .iter()
            .find(|c| c.broker_order_id == broker_order_id)
            .cloned()
    }
}

impl BrokerGateway for MockBrokerGateway {
    fn identity(&self) -> BrokerIdentity {
        self.identity.lock().clone()
    }

    fn min_tick_size(&self, contract: &FuturesContract) -> RegistryResult<Price> {
        self.tick_sizes.min_tick_size(contract)
    }

    fn ticker_for(&self, order: &ContractOrder) -> DynTicker {
        let ticker = self.hub.subscribe(order.contract(), order.side());
        self.tickers.lock().push(Arc::clone(&ticker));
        ticker
    }

    fn submit(&self, order: BrokerOrder) -> BoxFuture<'_, SubmissionOutcome> {
        Box::pin(async move {
            self.submits.lock().push(order.clone());
            let result = self.next_result.lock().clone();
            match result {
                MockSubmitResult::Accept(state) => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let control = Arc::new(MockOrderControl::new(format!("mock-{id}"), state));
                    self.controls.lock().push(Arc::clone(&control));
                    let mut placed = MonitoredOrder::new(order, control);
                    if self.attach_on_submit.load(Ordering::SeqCst) {
                        let ticker = self
                            .hub
                            .subscribe(placed.order().contract(), placed.order().side());
                        if let Err(e) = placed.attach_ticker(ticker) {
                            tracing::warn!(error = %e, "Mock ticker attach failed");
                        }
                    }
                    SubmissionOutcome::Submitted(placed)
                }
                MockSubmitResult::Reject(reason) => {
                    SubmissionOutcome::NoOrder(NoOrderReason::SubmissionRejected(reason))
                }
            }
        })
    }

    fn cancel<'a>(&'a self, order: &'a MonitoredOrder) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let id = order.broker_order_id().to_string();
            self.cancels.lock().push(id.clone());
            let accepted = self.accept_cancel.load(Ordering::SeqCst);
            if accepted {
                if let Some(control) = self.control(&id) {
                    control.set_state(OrderState::Cancelled);
                }
            }
            accepted
        })
    }

    fn modify_limit_price<'a>(
        &'a self,
        _order: &'a MonitoredOrder,
        replacement: BrokerOrder,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.modifications.lock().push(replacement);
            self.accept_modify.load(Ordering::SeqCst)
        })
    }
}
