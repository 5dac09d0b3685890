//! Market data types used for pricing orders.
//!
//! Contains the top-of-book `Tick`, its `QuoteState`, the per-side
//! `TickAnalysis` and the `BenchmarkPrices` snapshot that travels with a
//! broker order.

use crate::{OrderSide, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote state of a tick (null side detection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    /// Both bid and ask are present and valid.
    Valid,
    /// No bid side (bid price is zero or missing).
    NoBid,
    /// No ask side (ask price is zero or missing).
    NoAsk,
    /// Both sides missing.
    Empty,
    /// Bid above ask.
    Crossed,
}

impl std::fmt::Display for QuoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::NoBid => write!(f, "NO_BID"),
            Self::NoAsk => write!(f, "NO_ASK"),
            Self::Empty => write!(f, "EMPTY"),
            Self::Crossed => write!(f, "CROSSED"),
        }
    }
}

/// One top-of-book market data update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Best bid price.
    pub bid_price: Price,
    /// Best bid size.
    pub bid_size: Quantity,
    /// Best ask price.
    pub ask_price: Price,
    /// Best ask size.
    pub ask_size: Quantity,
    /// Timestamp when this tick was received.
    pub received_at: DateTime<Utc>,
}

impl Tick {
    /// Create a new tick stamped with the current time.
    pub fn new(bid_price: Price, bid_size: Quantity, ask_price: Price, ask_size: Quantity) -> Self {
        Self {
            bid_price,
            bid_size,
            ask_price,
            ask_size,
            received_at: Utc::now(),
        }
    }

    /// A tick with no quote on either side.
    pub fn empty() -> Self {
        Self::new(Price::ZERO, Quantity::ZERO, Price::ZERO, Quantity::ZERO)
    }

    /// Determine whether the tick is two-sided, one-sided, empty or crossed.
    pub fn state(&self) -> QuoteState {
        let has_bid = self.bid_price.is_positive() && self.bid_size.inner() > Decimal::ZERO;
        let has_ask = self.ask_price.is_positive() && self.ask_size.inner() > Decimal::ZERO;

        match (has_bid, has_ask) {
            (false, false) => QuoteState::Empty,
            (true, false) => QuoteState::NoAsk,
            (false, true) => QuoteState::NoBid,
            (true, true) => {
                if self.bid_price <= self.ask_price {
                    QuoteState::Valid
                } else {
                    QuoteState::Crossed
                }
            }
        }
    }

    /// Check if both bid and ask are present and not crossed. A locked
    /// quote (bid == ask) counts as valid.
    pub fn has_valid_bid_and_ask(&self) -> bool {
        self.state() == QuoteState::Valid
    }

    /// Calculate mid price: (bid + ask) / 2.
    ///
    /// Returns None if the quote is not valid.
    pub fn mid_price(&self) -> Option<Price> {
        if !self.has_valid_bid_and_ask() {
            return None;
        }
        Some(Price::new(
            (self.bid_price.inner() + self.ask_price.inner()) / Decimal::TWO,
        ))
    }

    /// Calculate spread: ask - bid.
    pub fn spread(&self) -> Price {
        self.ask_price - self.bid_price
    }

    /// Analyse this tick from the point of view of an order on `side`.
    ///
    /// The side price is the touch the order would cross to trade at once
    /// (ask for a buy, bid for a sell); the offside price is the opposite
    /// touch. All prices are `None` unless the quote is valid.
    pub fn analyse(&self, side: OrderSide) -> TickAnalysis {
        if !self.has_valid_bid_and_ask() {
            return TickAnalysis::unavailable(side);
        }
        let (side_price, side_qty, offside_price, offside_qty) = match side {
            OrderSide::Buy => (self.ask_price, self.ask_size, self.bid_price, self.bid_size),
            OrderSide::Sell => (self.bid_price, self.bid_size, self.ask_price, self.ask_size),
        };
        TickAnalysis {
            side,
            side_price: Some(side_price),
            offside_price: Some(offside_price),
            mid_price: self.mid_price(),
            side_qty: Some(side_qty),
            offside_qty: Some(offside_qty),
            spread: Some(self.spread()),
        }
    }
}

/// Result of analysing a tick for one trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickAnalysis {
    pub side: OrderSide,
    pub side_price: Option<Price>,
    pub offside_price: Option<Price>,
    pub mid_price: Option<Price>,
    pub side_qty: Option<Quantity>,
    pub offside_qty: Option<Quantity>,
    pub spread: Option<Price>,
}

impl TickAnalysis {
    fn unavailable(side: OrderSide) -> Self {
        Self {
            side,
            side_price: None,
            offside_price: None,
            mid_price: None,
            side_qty: None,
            offside_qty: None,
            spread: None,
        }
    }

    /// Project to the three reference prices carried by a broker order.
    pub fn benchmarks(&self) -> BenchmarkPrices {
        BenchmarkPrices {
            side_price: self.side_price,
            offside_price: self.offside_price,
            mid_price: self.mid_price,
        }
    }
}

/// Reference prices derived from one reference tick.
///
/// A plain `Copy` value: once built it is detached from the live stream,
/// so ticks arriving during pricing cannot change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BenchmarkPrices {
    pub side_price: Option<Price>,
    pub offside_price: Option<Price>,
    pub mid_price: Option<Price>,
}
