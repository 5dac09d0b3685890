//! Limit order at the caller's own price.

use xalgo_core::{BrokerOrderType, ContractOrder};
use xalgo_feed::BoxFuture;

use super::submission::{SubmissionOutcome, SubmissionRequest};
use super::{AlgoContext, AlgoKind, ExecutionAlgorithm};
use crate::error::{ExecutorError, ExecutorResult};
use crate::handle::MonitoredOrder;
use crate::pricing::LimitPriceSource;

/// Submits a limit order at the contract order's limit price and leaves
/// it working. The owner does not need to manage it.
pub struct InputLimitAlgo {
    ctx: AlgoContext,
    order: ContractOrder,
}

impl InputLimitAlgo {
    /// Fails if the contract order carries no limit price.
    pub fn new(ctx: AlgoContext, order: ContractOrder) -> ExecutorResult<Self> {
        if order.limit_price().is_none() {
            return Err(ExecutorError::InvalidPricingConfiguration(format!(
                "input_limit needs a limit price on order {order}"
            )));
        }
        Ok(Self { ctx, order })
    }
}

impl ExecutionAlgorithm for InputLimitAlgo {
    fn kind(&self) -> AlgoKind {
        AlgoKind::InputLimit
    }

    fn contract_order(&self) -> &ContractOrder {
        &self.order
    }

    fn requires_active_management(&self) -> bool {
        false
    }

    fn submit_trade(&mut self) -> BoxFuture<'_, ExecutorResult<SubmissionOutcome>> {
        Box::pin(async move {
            let request = SubmissionRequest::new(&self.order)
                .with_order_type(BrokerOrderType::Limit)
                .with_limit_price_source(LimitPriceSource::Input)
                .with_input_limit_price(self.order.limit_price())
                .with_broker_account(self.ctx.broker_account());
            self.ctx.submitter().submit(request).await
        })
    }

    fn manage_trade(&mut self, mut order: MonitoredOrder) -> BoxFuture<'_, MonitoredOrder> {
        Box::pin(async move {
            order.refresh();
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
        FuturesContract::new("US10", "20241200").unwrap()
    }

    #[tokio::test]
    async fn test_submits_rounded_input_price() {
        let gateway = Arc::new(MockBrokerGateway::new());
        gateway.set_tick_size(&contract(), Price::new(dec!(0.015625)));
        gateway.publish(
            &contract(),
            Tick::new(
                Price::new(dec!(110.5)),
                Quantity::from(50),
                Price::new(dec!(110.515625)),
                Quantity::from(50),
            ),
        );
        let ctx = AlgoContext::new(gateway.clone(), Arc::new(ExecutionConfig::default()));
        let order = ContractOrder::new(3, "carry", contract(), Quantity::from(-2))
            .unwrap()
            .with_limit_price(Price::new(dec!(110.52)));

        let mut algo = InputLimitAlgo::new(ctx, order).unwrap();
        assert!(!algo.requires_active_management());

        let placed = algo.submit_trade().await.unwrap().into_order().unwrap();
        assert_eq!(placed.order().limit_price(), Some(Price::new(dec!(110.515625))));

        gateway.last_control().unwrap().set_state(OrderState::PartialFilled);
        let placed = algo.manage_trade(placed).await;
        assert_eq!(placed.state(), OrderState::PartialFilled);
        assert!(gateway.get_cancels().is_empty());
    }
}
