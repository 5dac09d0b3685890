//! Precision-safe decimal types for order pricing.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that tick rounding
//! is exact: `100.05 / 0.02` is exactly `5002.5`, not `5002.4999...`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use crate::order::OrderSide;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with quantities in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to the nearest multiple of `tick_size`.
    ///
    /// Computes `tick * round(price / tick)`. Exact halfway cases round to
    /// the even multiple (banker's rounding), so `100.05` on a `0.02` grid
    /// becomes `100.04` and `100.07` becomes `100.08`.
    ///
    /// A zero or negative tick size leaves the price unchanged.
    #[inline]
    pub fn round_to_tick(&self, tick_size: Price) -> Self {
        if !tick_size.is_positive() {
            return *self;
        }
        let ticks = (self.0 / tick_size.0)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        Self((ticks * tick_size.0).normalize())
    }

    /// Whether the price sits exactly on the `tick_size` grid.
    #[inline]
    pub fn is_on_tick(&self, tick_size: Price) -> bool {
        if !tick_size.is_positive() {
            return true;
        }
        (self.0 % tick_size.0).is_zero()
    }

    /// Signed distance from `other` expressed in ticks.
    #[inline]
    pub fn ticks_from(&self, other: Price, tick_size: Price) -> Option<Decimal> {
        if !tick_size.is_positive() {
            return None;
        }
        Some((self.0 - other.0) / tick_size.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Signed trade quantity with exact decimal precision.
///
/// Positive quantities buy, negative quantities sell. Unlike `Price`
/// this is allowed to be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub Decimal);

impl Quantity {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Absolute size of the trade.
    #[inline]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Trade direction, `None` for a zero quantity.
    #[inline]
    pub fn side(&self) -> Option<OrderSide> {
        if self.0.is_zero() {
            None
        } else if self.0.is_sign_positive() {
            Some(OrderSide::Buy)
        } else {
            Some(OrderSide::Sell)
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Quantity {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl From<i64> for Quantity {
    fn from(n: i64) -> Self {
        Self(Decimal::from(n))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_to_tick_already_on_grid() {
        let price = Price::new(dec!(100.04));
        let tick = Price::new(dec!(0.02));

        assert_eq!(price.round_to_tick(tick), Price::new(dec!(100.04)));
    }

    #[test]
    fn test_round_to_tick_half_to_even() {
        let tick = Price::new(dec!(0.02));

        // 5002.5 ticks -> 5002
        assert_eq!(
            Price::new(dec!(100.05)).round_to_tick(tick),
            Price::new(dec!(100.04))
        );
        // 5003.5 ticks -> 5004
        assert_eq!(
            Price::new(dec!(100.07)).round_to_tick(tick),
            Price::new(dec!(100.08))
        );
    }

    #[test]
    fn test_round_to_tick_nearest() {
        let tick = Price::new(dec!(0.25));

        assert_eq!(
            Price::new(dec!(4501.1)).round_to_tick(tick),
            Price::new(dec!(4501))
        );
        assert_eq!(
            Price::new(dec!(4501.2)).round_to_tick(tick),
            Price::new(dec!(4501.25))
        );
    }

    #[test]
    fn test_round_to_tick_stays_within_half_tick() {
        let tick = Price::new(dec!(0.005));
        let mut raw = dec!(1.0901);
        while raw < dec!(1.1) {
            let price = Price::new(raw);
            let rounded = price.round_to_tick(tick);
            assert!(rounded.is_on_tick(tick), "{rounded} not on tick");
            assert!((rounded.inner() - raw).abs() <= tick.inner() / dec!(2));
            raw += dec!(0.0007);
        }
    }

    #[test]
    fn test_round_to_zero_tick_is_noop() {
        let price = Price::new(dec!(12.3456));
        assert_eq!(price.round_to_tick(Price::ZERO), price);
    }

    #[test]
    fn test_ticks_from() {
        let tick = Price::new(dec!(0.5));
        let a = Price::new(dec!(101));
        let b = Price::new(dec!(100));

        assert_eq!(a.ticks_from(b, tick), Some(dec!(2)));
        assert_eq!(b.ticks_from(a, tick), Some(dec!(-2)));
        assert_eq!(a.ticks_from(b, Price::ZERO), None);
    }

    #[test]
    fn test_quantity_side() {
        assert_eq!(Quantity::from(3).side(), Some(OrderSide::Buy));
        assert_eq!(Quantity::from(-2).side(), Some(OrderSide::Sell));
        assert_eq!(Quantity::ZERO.side(), None);
        assert_eq!(Quantity::from(-2).abs(), Quantity::from(2));
    }
}
