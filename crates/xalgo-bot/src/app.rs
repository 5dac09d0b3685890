//! Paper execution session.
//!
//! Wires the configured quotes, tick sizes and broker identity into a
//! paper gateway, then runs every configured order through the
//! execution engine concurrently.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use xalgo_core::{FuturesContract, Price, Quantity, Tick};
use xalgo_executor::{ExecutionEngine, ExecutionReport, ExecutionResult, ExecutorResult};
use xalgo_feed::MarketDataHub;
use xalgo_registry::TickSizeCache;

use crate::config::{AppConfig, PaperQuoteConfig};
use crate::error::AppResult;
use crate::paper::PaperGateway;

/// Counts of execution results for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub orders: usize,
    pub not_submitted: usize,
    pub released: usize,
    pub completed: usize,
    pub unresolved: usize,
    pub failed: usize,
}

impl SessionSummary {
    fn record(&mut self, result: &ExecutorResult<ExecutionReport>) {
        self.orders += 1;
        match result {
            Ok(report) => match report.result {
                ExecutionResult::NotSubmitted(_) => self.not_submitted += 1,
                ExecutionResult::Released(_) => self.released += 1,
                ExecutionResult::Completed(_) => self.completed += 1,
                ExecutionResult::Unresolved(_) => self.unresolved += 1,
            },
            Err(_) => self.failed += 1,
        }
    }
}

/// Paper trading session.
pub struct PaperSession {
    config: AppConfig,
    hub: Arc<MarketDataHub>,
    gateway: Arc<PaperGateway>,
    engine: ExecutionEngine,
}

impl PaperSession {
    /// Validate the configuration and build the session.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let tick_sizes = TickSizeCache::from_specs(&config.tick_sizes)?;
        let hub = Arc::new(MarketDataHub::new());
        let gateway = Arc::new(PaperGateway::new(
            config.broker.identity(),
            tick_sizes,
            Arc::clone(&hub),
        ));
        let engine = ExecutionEngine::new(gateway.clone(), config.execution.clone())?;

        Ok(Self {
            config,
            hub,
            gateway,
            engine,
        })
    }

    pub fn gateway(&self) -> &Arc<PaperGateway> {
        &self.gateway
    }

    /// Publish configured quotes, delayed ones from background tasks.
    fn publish_quotes(&self) -> AppResult<()> {
        for quote in &self.config.quotes {
            let contract = FuturesContract::new(quote.instrument.as_str(), &quote.contract_date)?;
            let tick = paper_tick(quote);
            if quote.delay_ms == 0 {
                self.hub.publish(&contract, tick);
            } else {
                let hub = Arc::clone(&self.hub);
                let delay = Duration::from_millis(quote.delay_ms);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    hub.publish(&contract, tick);
                });
            }
        }
        Ok(())
    }

    /// Execute every configured order.
    pub async fn run(self) -> AppResult<SessionSummary> {
        let orders = self.config.contract_orders()?;
        info!(
            orders = orders.len(),
            quotes = self.config.quotes.len(),
            broker = %self.config.broker.name,
            "Starting paper session"
        );
        self.publish_quotes()?;

        let mut summary = SessionSummary::default();
        for (order_id, result) in self.engine.execute_all(orders).await {
            log_result(order_id, &result);
            summary.record(&result);
        }
        Ok(summary)
    }
}

fn paper_tick(quote: &PaperQuoteConfig) -> Tick {
    Tick::new(
        Price::new(quote.bid),
        Quantity::new(quote.bid_size),
        Price::new(quote.ask),
        Quantity::new(quote.ask_size),
    )
}

fn log_result(order_id: u64, result: &ExecutorResult<ExecutionReport>) {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(order_id, error = %e, "Execution failed");
            return;
        }
    };
    let elapsed_ms = report.elapsed.as_millis() as u64;
    match &report.result {
        ExecutionResult::NotSubmitted(reason) => warn!(
            order_id,
            instrument = %report.instrument,
            algo = report.algo.as_str(),
            %reason,
            "Order not submitted"
        ),
        ExecutionResult::Unresolved(order) => error!(
            order_id,
            instrument = %report.instrument,
            broker_order_id = %order.broker_order_id(),
            elapsed_ms,
            "Order unresolved"
        ),
        other => {
            if let Some(order) = other.order() {
                let status = order.status();
                info!(
                    order_id,
                    instrument = %report.instrument,
                    algo = report.algo.as_str(),
                    result = other.as_str(),
                    state = status.state.as_str(),
                    filled = %status.filled_quantity,
                    fill_price = ?status.average_fill_price,
                    reprices = order.reprice_count(),
                    steps = report.management_steps,
                    elapsed_ms,
                    "Order done"
                );
            }
        }
    }
}
