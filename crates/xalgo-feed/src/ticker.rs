//! Live market data handle used while pricing and supervising one order.
//!
//! A ticker is bound to one contract and one trade direction. The
//! execution algorithm waits on it for a two-sided quote, derives the
//! benchmark prices from that quote, and records it as the reference tick
//! that later management steps compare the live market against.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, trace};

use xalgo_core::{FuturesContract, OrderSide, Price, Tick, TickAnalysis};

use crate::error::{FeedError, FeedResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Market data handle for one contract and trade direction.
pub trait TickerSource: Send + Sync + fmt::Debug {
    /// Contract this ticker streams.
    fn contract(&self) -> &FuturesContract;

    /// Direction of the order being priced.
    fn side(&self) -> OrderSide;

    /// Wait until a tick with both bid and ask is available.
    ///
    /// Resolves immediately if the latest tick already qualifies. Fails with
    /// [`FeedError::NoMarketData`] once `timeout` elapses.
    fn wait_for_valid_quote(&self, timeout: Duration) -> BoxFuture<'_, FeedResult<Tick>>;

    /// Latest tick, if any has been received.
    fn current_tick(&self) -> Option<Tick>;

    /// Record `tick` as the baseline for later comparisons, discarding any
    /// previous reference.
    fn set_reference(&self, tick: Tick);

    /// Baseline tick recorded by [`TickerSource::set_reference`].
    fn reference_tick(&self) -> Option<Tick>;

    /// Side, offside and mid prices of `tick` for this ticker's direction.
    fn analyse(&self, tick: &Tick) -> TickAnalysis {
        tick.analyse(self.side())
    }

    /// Ticks the side price has moved against the order since the
    /// reference tick. Positive is adverse (buy: ask went up, sell: bid
    /// went down).
    ///
    /// `None` without a reference, without a valid current quote, or with a
    /// non-positive tick size.
    fn adverse_move_ticks(&self, tick_size: Price) -> Option<Decimal> {
        let reference = self.analyse(&self.reference_tick()?).side_price?;
        let current = self.analyse(&self.current_tick()?).side_price?;
        let moved = current.ticks_from(reference, tick_size)?;
        Some(moved * Decimal::from(self.side().sign()))
    }
}

/// Shared handle to a ticker.
pub type DynTicker = Arc<dyn TickerSource>;

/// Ticker fed by a `tokio::sync::watch` channel.
///
/// The publisher side lives in [`crate::MarketDataHub`]; each subscriber
/// gets its own receiver, so a slow order never holds up the stream.
pub struct StreamingTicker {
    contract: FuturesContract,
    side: OrderSide,
    rx: watch::Receiver<Option<Tick>>,
    reference: Mutex<Option<Tick>>,
}

impl StreamingTicker {
    /// Create a ticker from a watch receiver.
    pub fn new(contract: FuturesContract, side: OrderSide, rx: watch::Receiver<Option<Tick>>) -> Self {
        Self {
            contract,
            side,
            rx,
            reference: Mutex::new(None),
        }
    }
}

impl fmt::Debug for StreamingTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingTicker")
            .field("contract", &self.contract)
            .field("side", &self.side)
            .field("has_reference", &self.reference.lock().is_some())
            .finish()
    }
}

impl TickerSource for StreamingTicker {
    fn contract(&self) -> &FuturesContract {
        &self.contract
    }

    fn side(&self) -> OrderSide {
        self.side
    }

    fn wait_for_valid_quote(&self, timeout: Duration) -> BoxFuture<'_, FeedResult<Tick>> {
        Box::pin(async move {
            let started = Instant::now();
            let mut rx = self.rx.clone();

            let quote = {
                let waited = tokio::time::timeout(
                    timeout,
                    rx.wait_for(|tick| tick.as_ref().is_some_and(Tick::has_valid_bid_and_ask)),
                )
                .await;
                match waited {
                    Ok(Ok(guard)) => (*guard).clone(),
                    // publisher dropped or deadline reached
                    Ok(Err(_)) | Err(_) => None,
                }
            };

            let waited_ms = started.elapsed().as_millis() as u64;
            match quote {
                Some(tick) => {
                    debug!(
                        contract = %self.contract,
                        bid = %tick.bid_price,
                        ask = %tick.ask_price,
                        waited_ms,
                        "Valid quote available"
                    );
                    Ok(tick)
                }
                None => Err(FeedError::NoMarketData {
                    contract: self.contract.to_string(),
                    waited_ms,
                }),
            }
        })
    }

    fn current_tick(&self) -> Option<Tick> {
        (*self.rx.borrow()).clone()
    }

    fn set_reference(&self, tick: Tick) {
        trace!(contract = %self.contract, "Reference tick set");
        *self.reference.lock() = Some(tick);
    }

    fn reference_tick(&self) -> Option<Tick> {
        self.reference.lock().clone()
    }
}
