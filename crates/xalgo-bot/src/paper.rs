//! Paper broker.
//!
//! Accepts every order and fills it against the latest published quote:
//! market orders at the side price, limit and stop-loss orders once the
//! side price reaches the limit. Fills are evaluated lazily whenever the
//! order status is read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use xalgo_core::{
    BrokerIdentity, BrokerOrder, ContractOrder, FuturesContract, OrderState, OrderStatusReport,
    Price, Tick,
};
use xalgo_executor::{
    BoxFuture, BrokerGateway, MonitoredOrder, OrderControl, SubmissionOutcome,
};
use xalgo_feed::{DynTicker, MarketDataHub};
use xalgo_registry::{RegistryResult, TickSizeCache};

/// A working paper order.
pub struct PaperOrder {
    broker_order_id: String,
    hub: Arc<MarketDataHub>,
    order: Mutex<BrokerOrder>,
    report: Mutex<OrderStatusReport>,
}

impl PaperOrder {
    fn new(broker_order_id: String, hub: Arc<MarketDataHub>, order: BrokerOrder) -> Self {
        Self {
            broker_order_id,
            hub,
            order: Mutex::new(order),
            report: Mutex::new(OrderStatusReport {
                state: OrderState::Open,
                ..OrderStatusReport::pending()
            }),
        }
    }

    /// Price the order would fill at against `tick`, if any.
    fn fill_price(order: &BrokerOrder, tick: &Tick) -> Option<Price> {
        let side_price = tick.analyse(order.side()).side_price?;
        match order.limit_price() {
            None => Some(side_price),
            Some(limit) => {
                let through = (limit.inner() - side_price.inner())
                    * Decimal::from(order.side().sign());
                (through >= Decimal::ZERO).then_some(side_price)
            }
        }
    }

    fn try_fill(&self) {
        let mut report = self.report.lock();
        if !report.state.is_active() {
            return;
        }
        let order = self.order.lock();
        let Some(tick) = self.hub.latest(order.contract()) else {
            return;
        };
        if let Some(price) = Self::fill_price(&order, &tick) {
            *report = OrderStatusReport {
                state: OrderState::Filled,
                filled_quantity: order.trade(),
                average_fill_price: Some(price),
            };
            info!(
                broker_order_id = %self.broker_order_id,
                contract = %order.contract(),
                trade = %order.trade(),
                %price,
                "Paper fill"
            );
        }
    }

    fn is_active(&self) -> bool {
        self.report.lock().state.is_active()
    }

    fn cancel(&self) -> bool {
        let mut report = self.report.lock();
        if report.state.is_active() {
            report.state = OrderState::Cancelled;
            true
        } else {
            false
        }
    }

    fn replace(&self, replacement: BrokerOrder) -> bool {
        if !self.report.lock().state.is_active() {
            return false;
        }
        *self.order.lock() = replacement;
        true
    }
}

impl std::fmt::Debug for PaperOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperOrder")
            .field("broker_order_id", &self.broker_order_id)
            .field("state", &self.report.lock().state)
            .finish()
    }
}

impl OrderControl for PaperOrder {
    fn broker_order_id(&self) -> &str {
        &self.broker_order_id
    }

    fn status(&self) -> OrderStatusReport {
        self.try_fill();
        *self.report.lock()
    }
}

/// Broker gateway that simulates fills from published quotes.
pub struct PaperGateway {
    identity: BrokerIdentity,
    tick_sizes: TickSizeCache,
    hub: Arc<MarketDataHub>,
    /// Working orders. Finished ones are dropped on the next submit.
    orders: DashMap<String, Arc<PaperOrder>>,
    next_id: AtomicU64,
}

impl PaperGateway {
    pub fn new(identity: BrokerIdentity, tick_sizes: TickSizeCache, hub: Arc<MarketDataHub>) -> Self {
        Self {
            identity,
            tick_sizes,
            hub,
            orders: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn hub(&self) -> &Arc<MarketDataHub> {
        &self.hub
    }

    /// Number of orders ever accepted.
    pub fn order_count(&self) -> usize {
        (self.next_id.load(Ordering::SeqCst) - 1) as usize
    }

    /// Orders still tracked by the book.
    pub fn working_order_count(&self) -> usize {
        self.orders.len()
    }

    fn prune_finished(&self) {
        self.orders.retain(|_, paper| paper.is_active());
    }

    fn lookup(&self, broker_order_id: &str) -> Option<Arc<PaperOrder>> {
        self.orders.get(broker_order_id).map(|o| Arc::clone(o.value()))
    }
}

impl BrokerGateway for PaperGateway {
    fn identity(&self) -> BrokerIdentity {
        self.identity.clone()
    }

    fn min_tick_size(&self, contract: &FuturesContract) -> RegistryResult<Price> {
        self.tick_sizes.min_tick_size(contract)
    }

    fn ticker_for(&self, order: &ContractOrder) -> DynTicker {
        self.hub.subscribe(order.contract(), order.side())
    }

    fn submit(&self, order: BrokerOrder) -> BoxFuture<'_, SubmissionOutcome> {
        Box::pin(async move {
            self.prune_finished();
            let id = format!("paper-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            debug!(broker_order_id = %id, "Paper order accepted {}", order);
            let paper = Arc::new(PaperOrder::new(id.clone(), Arc::clone(&self.hub), order.clone()));
            self.orders.insert(id, Arc::clone(&paper));
            SubmissionOutcome::Submitted(MonitoredOrder::new(order, paper))
        })
    }

    fn cancel<'a>(&'a self, order: &'a MonitoredOrder) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let cancelled = self
                .lookup(order.broker_order_id())
                .is_some_and(|paper| paper.cancel());
            if cancelled {
                self.orders.remove(order.broker_order_id());
            }
            cancelled
        })
    }

    fn modify_limit_price<'a>(
        &'a self,
        order: &'a MonitoredOrder,
        replacement: BrokerOrder,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.lookup(order.broker_order_id())
                .is_some_and(|paper| paper.replace(replacement))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use xalgo_core::{BenchmarkPrices, BrokerOrderType, Quantity};

    fn contract() -> FuturesContract {
        FuturesContract::new("GOLD", "20241200").unwrap()
    }

    fn quote(bid: Decimal, ask: Decimal) -> Tick {
        Tick::new(Price::new(bid), Quantity::from(5), Price::new(ask), Quantity::from(5))
    }

    fn broker_order(qty: i64, limit: Option<Decimal>) -> BrokerOrder {
        let order = ContractOrder::new(1, "test", contract(), Quantity::from(qty)).unwrap();
        let order_type = if limit.is_some() {
            BrokerOrderType::Limit
        } else {
            BrokerOrderType::Market
        };
        BrokerOrder::from_contract_order(
            &order,
            order_type,
            BenchmarkPrices::default(),
            limit.map(Price::new),
            BrokerIdentity::new("paper", "PAPER", 1),
        )
    }

    fn gateway() -> PaperGateway {
        let hub = Arc::new(MarketDataHub::new());
        hub.publish(&contract(), quote(dec!(2400.0), dec!(2400.2)));
        PaperGateway::new(BrokerIdentity::new("paper", "PAPER", 1), TickSizeCache::new(), hub)
    }

    #[tokio::test]
    async fn test_market_order_fills_at_side_price() {
        let gateway = gateway();
        let placed = gateway.submit(broker_order(-1, None)).await.into_order().unwrap();

        let status = placed.control().status();
        assert_eq!(status.state, OrderState::Filled);
        assert_eq!(status.average_fill_price, Some(Price::new(dec!(2400.0))));
        assert_eq!(status.filled_quantity, Quantity::from(-1));
    }

    #[tokio::test]
    async fn test_passive_limit_waits_for_market() {
        let gateway = gateway();
        let placed = gateway
            .submit(broker_order(1, Some(dec!(2400.0))))
            .await
            .into_order()
            .unwrap();
        assert_eq!(placed.control().status().state, OrderState::Open);

        gateway
            .hub()
            .publish(&contract(), quote(dec!(2399.8), dec!(2400.0)));
        assert_eq!(placed.control().status().state, OrderState::Filled);
    }

    #[tokio::test]
    async fn test_modify_then_fill_at_new_price() {
        let gateway = gateway();
        let placed = gateway
            .submit(broker_order(1, Some(dec!(2399.0))))
            .await
            .into_order()
            .unwrap();

        let replacement = placed.order().with_new_limit_price(Price::new(dec!(2400.2)));
        assert!(gateway.modify_limit_price(&placed, replacement).await);
        assert_eq!(placed.control().status().state, OrderState::Filled);
    }

    #[tokio::test]
    async fn test_cancel_only_while_active() {
        let gateway = gateway();
        let placed = gateway
            .submit(broker_order(1, Some(dec!(2390.0))))
            .await
            .into_order()
            .unwrap();

        assert!(gateway.cancel(&placed).await);
        assert!(!gateway.cancel(&placed).await);
        assert_eq!(placed.control().status().state, OrderState::Cancelled);
        assert_eq!(gateway.order_count(), 1);
        assert_eq!(gateway.working_order_count(), 0);
    }

    #[tokio::test]
    async fn test_finished_orders_leave_the_book() {
        let gateway = gateway();
        let resting = gateway
            .submit(broker_order(1, Some(dec!(2390.0))))
            .await
            .into_order()
            .unwrap();
        let filled = gateway.submit(broker_order(1, None)).await.into_order().unwrap();
        assert_eq!(filled.control().status().state, OrderState::Filled);
        assert_eq!(gateway.working_order_count(), 2);

        gateway.submit(broker_order(1, Some(dec!(2391.0)))).await;
        assert_eq!(gateway.working_order_count(), 2);
        assert_eq!(gateway.order_count(), 3);
        assert_eq!(resting.control().status().state, OrderState::Open);
        assert!(gateway.cancel(&resting).await);
    }
}
