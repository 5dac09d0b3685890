//! Market order algorithm.

use std::time::Duration;

use tracing::{debug, warn};

use xalgo_core::{BrokerOrderType, ContractOrder};
use xalgo_feed::BoxFuture;

use super::submission::{SubmissionOutcome, SubmissionRequest};
use super::{send_cancel, AlgoContext, AlgoKind, ExecutionAlgorithm};
use crate::error::ExecutorResult;
use crate::handle::MonitoredOrder;

/// Submits a market order and cancels it if it is still working after
/// `market_order_timeout`.
pub struct MarketAlgo {
    ctx: AlgoContext,
    order: ContractOrder,
    timeout: Duration,
}

impl MarketAlgo {
    pub fn new(ctx: AlgoContext, order: ContractOrder) -> Self {
        let timeout = ctx.config().market_order_timeout();
        Self {
            ctx,
            order,
            timeout,
        }
    }

    fn log_execution_report(order: &MonitoredOrder) {
        let current_tick = order.ticker().and_then(|t| t.current_tick());
        debug!(
            client_order_id = %order.order().client_order_id(),
            instrument = %order.order().instrument_code(),
            order_id = order.order().contract_order_id(),
            state = order.state().as_str(),
            filled = %order.status().filled_quantity,
            tick = ?current_tick,
            "Market order execution current tick"
        );
    }
}

impl ExecutionAlgorithm for MarketAlgo {
    fn kind(&self) -> AlgoKind {
        AlgoKind::Market
    }

    fn contract_order(&self) -> &ContractOrder {
        &self.order
    }

    fn submit_trade(&mut self) -> BoxFuture<'_, ExecutorResult<SubmissionOutcome>> {
        Box::pin(async move {
            let request = SubmissionRequest::new(&self.order)
                .with_order_type(BrokerOrderType::Market)
                .with_broker_account(self.ctx.broker_account());
            self.ctx.submitter().submit(request).await
        })
    }

    fn manage_trade(&mut self, mut order: MonitoredOrder) -> BoxFuture<'_, MonitoredOrder> {
        Box::pin(async move {
            order.refresh();
            Self::log_execution_report(&order);
            if order.is_terminal() || order.cancel_sent() {
                return order;
            }

            if order.cancel_requested() {
                send_cancel(self.ctx.gateway(), &mut order, self.name(), "cancel requested").await;
            } else if order.elapsed() >= self.timeout {
                warn!(
                    client_order_id = %order.order().client_order_id(),
                    instrument = %order.order().instrument_code(),
                    elapsed_ms = order.elapsed().as_millis() as u64,
                    "Market order not filled in time"
                );
                send_cancel(self.ctx.gateway(), &mut order, self.name(), "market order timeout").await;
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
    use xalgo_core::{FuturesContract, OrderState, Price, Quantity, Tick};

    fn contract() -> FuturesContract {
        FuturesContract::new("SOFR", "20250300").unwrap()
    }

    fn setup(timeout_ms: u64) -> (Arc<MockBrokerGateway>, MarketAlgo) {
        let gateway = Arc::new(MockBrokerGateway::new());
        gateway.publish(
            &contract(),
            Tick::new(
                Price::new(dec!(95.5)),
                Quantity::from(100),
                Price::new(dec!(95.505)),
                Quantity::from(80),
            ),
        );
        let config = ExecutionConfig {
            market_order_timeout_ms: timeout_ms,
            quote_wait_timeout_ms: 100,
            ..Default::default()
        };
        let ctx = AlgoContext::new(gateway.clone(), Arc::new(config));
        let order = ContractOrder::new(5, "trend", contract(), Quantity::from(4)).unwrap();
        (gateway, MarketAlgo::new(ctx, order))
    }

    #[tokio::test]
    async fn test_filled_order_is_left_alone() {
        let (gateway, mut algo) = setup(60_000);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();
        assert_eq!(order.order().order_type(), BrokerOrderType::Market);

        gateway
            .last_control()
            .unwrap()
            .fill(Quantity::from(4), Price::new(dec!(95.505)));
        let order = algo.manage_trade(order).await;

        assert_eq!(order.state(), OrderState::Filled);
        assert!(gateway.get_cancels().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_cancels() {
        let (gateway, mut algo) = setup(0);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();

        let order = algo.manage_trade(order).await;
        assert!(order.cancel_sent());
        assert_eq!(gateway.get_cancels(), vec![order.broker_order_id().to_string()]);

        let order = algo.manage_trade(order).await;
        assert_eq!(order.state(), OrderState::Cancelled);
        assert_eq!(gateway.get_cancels().len(), 1);
    }

    #[tokio::test]
    async fn test_working_order_within_timeout_is_kept() {
        let (gateway, mut algo) = setup(60_000);
        let order = algo.submit_trade().await.unwrap().into_order().unwrap();

        let order = algo.manage_trade(order).await;
        assert_eq!(order.state(), OrderState::Open);
        assert!(gateway.get_cancels().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_request_is_honoured() {
        let (gateway, mut algo) = setup(60_000);
        let mut order = algo.submit_trade().await.unwrap().into_order().unwrap();

        order.request_cancel();
        let order = algo.manage_trade(order).await;
        assert!(order.cancel_sent());
        assert_eq!(gateway.get_cancels().len(), 1);
    }
}
