//! Passive-then-aggressive limit order algorithm.
//!
//! Joins the near touch (offside price) and waits. The order crosses the
//! spread by re-pricing to the side price once the passive window runs
//! out or the market moves `adverse_move_ticks` against it. Once
//! aggressive it keeps chasing the side price. Anything still working at
//! `total_time_limit` is cancelled.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use xalgo_core::{BrokerOrderType, ContractOrder, Price};
use xalgo_feed::BoxFuture;
use xalgo_telemetry::Metrics;

use super::submission::{SubmissionOutcome, SubmissionRequest};
use super::{send_cancel, AlgoContext, AlgoKind, ExecutionAlgorithm};
use crate::error::ExecutorResult;
use crate::handle::MonitoredOrder;
use crate::pricing::LimitPriceSource;

pub struct BestLimitAlgo {
    ctx: AlgoContext,
    order: ContractOrder,
    passive_time_limit: Duration,
    total_time_limit: Duration,
    adverse_move_ticks: Decimal,
    aggressive: bool,
}

impl BestLimitAlgo {
    pub fn new(ctx: AlgoContext, order: ContractOrder) -> Self {
        let config = ctx.config();
        let passive_time_limit = config.passive_time_limit();
        let total_time_limit = config.total_time_limit();
        let adverse_move_ticks = Decimal::from(config.adverse_move_ticks);
        Self {
            ctx,
            order,
            passive_time_limit,
            total_time_limit,
            adverse_move_ticks,
            aggressive: false,
        }
    }

    /// Whether the order has already crossed the spread.
    pub fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    /// Reason to stop being passive, if any.
    fn aggressive_trigger(&self, order: &MonitoredOrder) -> Option<&'static str> {
        if order.elapsed() >= self.passive_time_limit {
            return Some("passive time limit reached");
        }
        let tick_size = self.ctx.gateway().min_tick_size(self.order.contract()).ok()?;
        let moved = order.ticker()?.adverse_move_ticks(tick_size)?;
        (moved >= self.adverse_move_ticks).then_some("adverse price move")
    }

    /// Current side price of the order's ticker.
    fn current_side_price(order: &MonitoredOrder) -> Option<Price> {
        let ticker = order.ticker()?;
        let tick = ticker.current_tick()?;
        ticker.analyse(&tick).side_price
    }

    /// Side price has moved past our limit (buy: above, sell: below).
    fn market_moved_away(&self, order: &MonitoredOrder) -> bool {
        let (Some(side_price), Some(limit)) = (Self::current_side_price(order), order.order().limit_price())
        else {
            return false;
        };
        (side_price.inner() - limit.inner()) * Decimal::from(self.order.side().sign()) > Decimal::ZERO
    }

    /// Cancel/replace at the current side price.
    async fn reprice_to_side(&mut self, order: &mut MonitoredOrder, reason: &'static str) {
        let Some(side_price) = Self::current_side_price(order) else {
            debug!(
                client_order_id = %order.order().client_order_id(),
                reason,
                "No valid quote to re-price against"
            );
            return;
        };
        let new_price = self.ctx.resolver().round_for(&self.order, side_price);
        if order.order().limit_price() == Some(new_price) {
            self.aggressive = true;
            return;
        }

        let replacement = order.order().with_new_limit_price(new_price);
        if self
            .ctx
            .gateway()
            .modify_limit_price(order, replacement.clone())
            .await
        {
            info!(
                instrument = %self.order.instrument_code(),
                order_id = self.order.order_id(),
                old_limit = ?order.order().limit_price(),
                new_limit = %new_price,
                reason,
                "Re-priced order to side price"
            );
            order.replace_broker_order(replacement);
            self.aggressive = true;
            Metrics::reprice(self.name());
        } else {
            warn!(
                instrument = %self.order.instrument_code(),
                order_id = self.order.order_id(),
                client_order_id = %order.order().client_order_id(),
                new_limit = %new_price,
                reason,
                "Re-price refused by broker, existing order left unchanged"
            );
        }
    }
}

impl ExecutionAlgorithm for BestLimitAlgo {
    fn kind(&self) -> AlgoKind {
        AlgoKind::BestLimit
    }

    fn contract_order(&self) -> &ContractOrder {
        &self.order
    }

    fn submit_trade(&mut self) -> BoxFuture<'_, ExecutorResult<SubmissionOutcome>> {
        Box::pin(async move {
            self.aggressive = false;
            let request = SubmissionRequest::new(&self.order)
                .with_order_type(BrokerOrderType::Limit)
                .with_limit_price_source(LimitPriceSource::OffsidePrice)
                .with_broker_account(self.ctx.broker_account());
            self.ctx.submitter().submit(request).await
        })
    }

    fn manage_trade(&mut self, mut order: MonitoredOrder) -> BoxFuture<'_, MonitoredOrder> {
        Box::pin(async move {
            order.refresh();
            if order.is_terminal() || order.cancel_sent() {
                return order;
            }

            if order.cancel_requested() {
                send_cancel(self.ctx.gateway(), &mut order, self.name(), "cancel requested").await;
                return order;
            }

            if order.elapsed() >= self.total_time_limit {
                warn!(
                    client_order_id = %order.order().client_order_id(),
                    instrument = %self.order.instrument_code(),
                    aggressive = self.aggressive,
                    "Best limit order not filled in time"
                );
                send_cancel(self.ctx.gateway(), &mut order, self.name(), "total time limit").await;
                return order;
            }

            if !self.aggressive {
                if let Some(reason) = self.aggressive_trigger(&order) {
                    self.reprice_to_side(&mut order, reason).await;
                }
            } else if self.market_moved_away(&order) {
                self.reprice_to_side(&mut order, "chasing side price").await;
            }
            order
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::mock::MockBrokerGateway;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use xalgo_core::{FuturesContract, OrderState, Quantity, Tick};

    fn contract() -> FuturesContract {
        FuturesContract::new("GOLD", "20241200").unwrap()
    }

    fn quote(bid: Decimal, ask: Decimal) -> Tick {
        Tick::new(
            Price::new(bid),
            Quantity::from(3),
            Price::new(ask),
            Quantity::from(3),
        )
    }

    fn setup(passive_ms: u64, total_ms: u64, qty: i64) -> (Arc<MockBrokerGateway>, BestLimitAlgo) {
        let gateway = Arc::new(MockBrokerGateway::new());
        gateway.set_tick_size(&contract(), Price::new(dec!(0.1)));
        gateway.publish(&contract(), quote(dec!(2400.0), dec!(2400.2)));
        let config = ExecutionConfig {
            passive_time_limit_ms: passive_ms,
            total_time_limit_ms: total_ms,
            quote_wait_timeout_ms: 100,
            ..Default::default()
        };
        let ctx = AlgoContext::new(gateway.clone(), Arc::new(config));
        let order = ContractOrder::new(21, "trend", contract(), Quantity::from(qty)).unwrap();
        (gateway, BestLimitAlgo::new(ctx, order))
    }

    #[tokio::test]
    async fn test_starts_passive_at_offside() {
        let (_gateway, mut algo) = setup(60_000, 120_000, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();

        assert_eq!(order.order().order_type(), BrokerOrderType::Limit);
        assert_eq!(order.order().limit_price(), Some(Price::new(dec!(2400.0))));
        assert!(!algo.is_aggressive());
    }

    #[tokio::test]
    async fn test_sell_starts_passive_at_ask() {
        let (_gateway, mut algo) = setup(60_000, 120_000, -1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();
        assert_eq!(order.order().limit_price(), Some(Price::new(dec!(2400.2))));
    }

    #[tokio::test]
    async fn test_goes_aggressive_after_passive_window() {
        let (gateway, mut algo) = setup(0, 120_000, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();
        let first_id = order.order().client_order_id().clone();

        let order = algo.manage_trade(order).await;

        assert!(algo.is_aggressive());
        assert_eq!(order.reprice_count(), 1);
        assert_eq!(order.order().limit_price(), Some(Price::new(dec!(2400.2))));
        assert_ne!(order.order().client_order_id(), &first_id);
        assert_eq!(gateway.get_modifications().len(), 1);
    }

    #[tokio::test]
    async fn test_goes_aggressive_on_adverse_move() {
        let (gateway, mut algo) = setup(60_000, 120_000, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();

        // one tick against us: stay passive
        gateway.publish(&contract(), quote(dec!(2400.1), dec!(2400.3)));
        let order = algo.manage_trade(order).await;
        assert!(!algo.is_aggressive());
        assert!(gateway.get_modifications().is_empty());

        // three ticks against us: cross the spread
        gateway.publish(&contract(), quote(dec!(2400.3), dec!(2400.5)));
        let order = algo.manage_trade(order).await;
        assert!(algo.is_aggressive());
        assert_eq!(order.order().limit_price(), Some(Price::new(dec!(2400.5))));
    }

    #[tokio::test]
    async fn test_favourable_move_stays_passive() {
        let (gateway, mut algo) = setup(60_000, 120_000, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();

        gateway.publish(&contract(), quote(dec!(2399.5), dec!(2399.7)));
        let order = algo.manage_trade(order).await;
        assert!(!algo.is_aggressive());
        assert_eq!(order.reprice_count(), 0);
    }

    #[tokio::test]
    async fn test_aggressive_order_chases_side_price() {
        let (gateway, mut algo) = setup(0, 120_000, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();
        let order = algo.manage_trade(order).await;
        assert_eq!(order.reprice_count(), 1);

        // no move: nothing to do
        let order = algo.manage_trade(order).await;
        assert_eq!(order.reprice_count(), 1);

        gateway.publish(&contract(), quote(dec!(2400.4), dec!(2400.6)));
        let order = algo.manage_trade(order).await;
        assert_eq!(order.reprice_count(), 2);
        assert_eq!(order.order().limit_price(), Some(Price::new(dec!(2400.6))));
    }

    #[tokio::test]
    async fn test_refused_reprice_keeps_order() {
        let (gateway, mut algo) = setup(0, 120_000, 1);
        gateway.set_accept_modify(false);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();
        let original = order.order().clone();

        let order = algo.manage_trade(order).await;

        assert!(!algo.is_aggressive());
        assert_eq!(order.reprice_count(), 0);
        assert_eq!(order.order(), &original);
        assert_eq!(gateway.get_modifications().len(), 1);
    }

    #[tokio::test]
    async fn test_total_time_limit_cancels() {
        let (gateway, mut algo) = setup(0, 0, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();

        let order = algo.manage_trade(order).await;
        assert!(order.cancel_sent());
        assert!(gateway.get_modifications().is_empty());

        let order = algo.manage_trade(order).await;
        assert_eq!(order.state(), OrderState::Cancelled);
    }

    #[tokio::test]
    async fn test_fill_ends_management() {
        let (gateway, mut algo) = setup(0, 0, 1);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();
        gateway
            .last_control()
            .unwrap()
            .fill(Quantity::from(1), Price::new(dec!(2400.0)));

        let order = algo.manage_trade(order).await;
        assert_eq!(order.state(), OrderState::Filled);
        assert!(gateway.get_cancels().is_empty());
    }
}
