//! Execution engine.
//!
//! Picks an algorithm per contract order, submits once, then drives the
//! management loop until the order is terminal. Orders run concurrently,
//! one task each; the steps of a single order are strictly sequential.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use xalgo_core::ContractOrder;
use xalgo_telemetry::Metrics;

use crate::algo::{
    build_algo, AlgoContext, AlgoKind, AlgoSelector, ExecutionAlgorithm, NoOrderReason,
    SubmissionOutcome,
};
use crate::config::ExecutionConfig;
use crate::error::ExecutorResult;
use crate::gateway::DynBrokerGateway;
use crate::handle::MonitoredOrder;

/// How an execution ended.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Nothing was placed.
    NotSubmitted(NoOrderReason),
    /// Fire-and-forget order handed back working.
    Released(MonitoredOrder),
    /// Managed to a terminal state.
    Completed(MonitoredOrder),
    /// Still not terminal after the cancel grace period.
    Unresolved(MonitoredOrder),
}

impl ExecutionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSubmitted(_) => "not_submitted",
            Self::Released(_) => "released",
            Self::Completed(_) => "completed",
            Self::Unresolved(_) => "unresolved",
        }
    }

    pub fn order(&self) -> Option<&MonitoredOrder> {
        match self {
            Self::NotSubmitted(_) => None,
            Self::Released(order) | Self::Completed(order) | Self::Unresolved(order) => Some(order),
        }
    }
}

/// Outcome of one contract order.
#[derive(Debug)]
pub struct ExecutionReport {
    pub order_id: u64,
    pub instrument: String,
    pub algo: AlgoKind,
    pub result: ExecutionResult,
    pub management_steps: u32,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Schedules execution algorithms.
#[derive(Clone)]
pub struct ExecutionEngine {
    ctx: AlgoContext,
    selector: AlgoSelector,
}

impl ExecutionEngine {
    /// Validate the configuration and build the engine.
    pub fn new(gateway: DynBrokerGateway, config: ExecutionConfig) -> ExecutorResult<Self> {
        config.validate()?;
        let selector = AlgoSelector::from_config(&config)?;
        Ok(Self {
            ctx: AlgoContext::new(gateway, Arc::new(config)),
            selector,
        })
    }

    pub fn context(&self) -> &AlgoContext {
        &self.ctx
    }

    pub fn selector(&self) -> &AlgoSelector {
        &self.selector
    }

    /// Execute one contract order to completion.
    pub async fn execute(&self, order: ContractOrder) -> ExecutorResult<ExecutionReport> {
        let started = Instant::now();
        let started_at = Utc::now();
        let order_id = order.order_id();
        let instrument = order.instrument_code().to_string();

        let kind = self.selector.select(&order)?;
        let mut algo = build_algo(kind, &self.ctx, order)?;
        info!(order_id, %instrument, algo = kind.as_str(), "Executing {}", algo.contract_order());

        let outcome = algo.submit_trade().await?;
        let (result, management_steps) = match outcome {
            SubmissionOutcome::NoOrder(reason) => (ExecutionResult::NotSubmitted(reason), 0),
            SubmissionOutcome::Submitted(placed) if !algo.requires_active_management() => {
                info!(
                    order_id,
                    broker_order_id = %placed.broker_order_id(),
                    "Order released without management"
                );
                (ExecutionResult::Released(placed), 0)
            }
            SubmissionOutcome::Submitted(placed) => {
                Metrics::management_started();
                let managed = self.manage(algo.as_mut(), placed, started).await;
                Metrics::management_finished();
                managed
            }
        };

        Ok(ExecutionReport {
            order_id,
            instrument,
            algo: kind,
            result,
            management_steps,
            started_at,
            elapsed: started.elapsed(),
        })
    }

    /// Management loop for one live order.
    async fn manage(
        &self,
        algo: &mut dyn ExecutionAlgorithm,
        placed: MonitoredOrder,
        started: Instant,
    ) -> (ExecutionResult, u32) {
        let config = self.ctx.config();
        let poll_interval = config.manage_poll_interval();
        let max_management_time = config.max_management_time();
        let grace_period = config.cancel_grace_period();

        let mut order = placed;
        let mut steps = 0u32;
        let mut cancel_deadline: Option<Instant> = None;

        loop {
            order = algo.manage_trade(order).await;
            steps += 1;

            if order.is_terminal() {
                info!(
                    order_id = order.order().contract_order_id(),
                    broker_order_id = %order.broker_order_id(),
                    state = order.state().as_str(),
                    filled = %order.status().filled_quantity,
                    steps,
                    "Order finished"
                );
                Metrics::order_completed(order.state().as_str());
                return (ExecutionResult::Completed(order), steps);
            }

            match cancel_deadline {
                None if started.elapsed() >= max_management_time => {
                    warn!(
                        order_id = order.order().contract_order_id(),
                        algo = algo.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Management time exceeded, requesting cancel"
                    );
                    order.request_cancel();
                    cancel_deadline = Some(Instant::now() + grace_period);
                }
                Some(deadline) if Instant::now() >= deadline => {
                    error!(
                        order_id = order.order().contract_order_id(),
                        broker_order_id = %order.broker_order_id(),
                        state = order.state().as_str(),
                        "Order still not terminal after cancel grace period"
                    );
                    Metrics::order_completed("unresolved");
                    return (ExecutionResult::Unresolved(order), steps);
                }
                _ => {}
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Execute many orders concurrently, one task per order.
    ///
    /// Reports come back sorted by contract order id.
    pub async fn execute_all(
        &self,
        orders: Vec<ContractOrder>,
    ) -> Vec<(u64, ExecutorResult<ExecutionReport>)> {
        let mut tasks = JoinSet::new();
        for order in orders {
            let engine = self.clone();
            tasks.spawn(async move {
                let order_id = order.order_id();
                (order_id, engine.execute(order).await)
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "Execution task failed"),
            }
        }
        reports.sort_by_key(|(order_id, _)| *order_id);
        reports
    }
}
