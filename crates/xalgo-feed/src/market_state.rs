//! Per-contract quote distribution.
//!
//! Keeps the latest tick for every contract and hands out tickers that
//! observe it. Publishing never blocks on subscribers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, trace};

use xalgo_core::{FuturesContract, OrderSide, Tick};

use crate::ticker::{DynTicker, StreamingTicker};

/// Aggregated market data hub.
pub struct MarketDataHub {
    /// One channel per contract, created on first publish or subscribe.
    channels: DashMap<FuturesContract, watch::Sender<Option<Tick>>>,
}

impl MarketDataHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    fn with_sender<R>(
        &self,
        contract: &FuturesContract,
        f: impl FnOnce(&watch::Sender<Option<Tick>>) -> R,
    ) -> R {
        let entry = self.channels.entry(contract.clone()).or_insert_with(|| {
            debug!(%contract, "Opening market data channel");
            watch::channel(None).0
        });
        f(entry.value())
    }

    /// Publish a tick for a contract, replacing the previous one.
    pub fn publish(&self, contract: &FuturesContract, tick: Tick) {
        trace!(
            %contract,
            bid = %tick.bid_price,
            ask = %tick.ask_price,
            state = %tick.state(),
            "Tick published"
        );
        self.with_sender(contract, |tx| {
            tx.send_replace(Some(tick));
        });
    }

    /// Open a ticker on a contract for an order on `side`.
    ///
    /// The ticker sees the latest published tick immediately, and every
    /// tick published afterwards.
    pub fn subscribe(&self, contract: &FuturesContract, side: OrderSide) -> DynTicker {
        let rx = self.with_sender(contract, watch::Sender::subscribe);
        Arc::new(StreamingTicker::new(contract.clone(), side, rx))
    }

    /// Latest tick for a contract.
    pub fn latest(&self, contract: &FuturesContract) -> Option<Tick> {
        self.channels
            .get(contract)
            .and_then(|tx| (*tx.borrow()).clone())
    }

    /// Contracts with an open channel.
    pub fn contracts(&self) -> Vec<FuturesContract> {
        self.channels.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of live tickers on a contract.
    pub fn subscriber_count(&self, contract: &FuturesContract) -> usize {
        self.channels
            .get(contract)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Close a contract's channel. Tickers still waiting for a quote on it
    /// fail with no market data.
    pub fn close(&self, contract: &FuturesContract) -> bool {
        self.channels.remove(contract).is_some()
    }
}

impl Default for MarketDataHub {
    fn default() -> Self {
        Self::new()
    }
}
