//! Order types for the contract-order → broker-order pipeline.
//!
//! This module provides:
//! - `ContractOrder`: the instrument-level intent handed to an algorithm
//! - `BrokerOrder`: the venue-bound order, built once per submission attempt
//! - `BrokerIdentity`: broker name, account and client id
//! - `OrderState` / `OrderStatusReport`: broker-side lifecycle

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::FuturesContract;
use crate::error::{CoreError, Result};
use crate::order::{BrokerOrderType, ClientOrderId, OrderSide};
use crate::types::BenchmarkPrices;
use crate::{Price, Quantity};

// ============================================================================
// Contract Order
// ============================================================================

/// Instrument-level trade request, before it is bound to a broker.
///
/// Created by the position-sizing layer and read-only from the point it is
/// handed to an execution algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractOrder {
    order_id: u64,
    strategy_name: String,
    contract: FuturesContract,
    trade: Quantity,
    side: OrderSide,
    limit_price: Option<Price>,
    algo_to_use: Option<String>,
    log_metadata: BTreeMap<String, String>,
}

impl ContractOrder {
    /// Create a contract order. A zero trade is rejected.
    pub fn new(
        order_id: u64,
        strategy_name: impl Into<String>,
        contract: FuturesContract,
        trade: Quantity,
    ) -> Result<Self> {
        let side = trade.side().ok_or_else(|| {
            CoreError::InvalidQuantity(format!("zero trade for contract order {order_id}"))
        })?;
        Ok(Self {
            order_id,
            strategy_name: strategy_name.into(),
            contract,
            trade,
            side,
            limit_price: None,
            algo_to_use: None,
            log_metadata: BTreeMap::new(),
        })
    }

    /// Attach a caller-supplied limit price.
    #[must_use]
    pub fn with_limit_price(mut self, price: Price) -> Self {
        self.limit_price = Some(price);
        self
    }

    /// Request a specific execution algorithm by name.
    #[must_use]
    pub fn with_algo(mut self, algo: impl Into<String>) -> Self {
        self.algo_to_use = Some(algo.into());
        self
    }

    /// Add a logging metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.log_metadata.insert(key.into(), value.into());
        self
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn contract(&self) -> &FuturesContract {
        &self.contract
    }

    pub fn instrument_code(&self) -> &str {
        self.contract.instrument_code.as_str()
    }

    pub fn trade(&self) -> Quantity {
        self.trade
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn limit_price(&self) -> Option<Price> {
        self.limit_price
    }

    pub fn algo_to_use(&self) -> Option<&str> {
        self.algo_to_use.as_deref()
    }

    /// Identity fields plus the caller's metadata, for structured logging.
    pub fn log_attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = self.log_metadata.clone();
        attrs.insert("instrument_code".to_string(), self.instrument_code().to_string());
        attrs.insert("contract_date".to_string(), self.contract.contract_date.clone());
        attrs.insert("contract_order_id".to_string(), self.order_id.to_string());
        attrs.insert("strategy_name".to_string(), self.strategy_name.clone());
        attrs
    }
}

impl std::fmt::Display for ContractOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {} {}",
            self.order_id, self.strategy_name, self.contract, self.trade
        )?;
        if let Some(limit) = self.limit_price {
            write!(f, " lmt {limit}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Broker Identity
// ============================================================================

/// Broker name, account and API client id used to route an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerIdentity {
    pub broker: String,
    pub account: String,
    pub client_id: u32,
}

impl BrokerIdentity {
    pub fn new(broker: impl Into<String>, account: impl Into<String>, client_id: u32) -> Self {
        Self {
            broker: broker.into(),
            account: account.into(),
            client_id,
        }
    }

    /// Replace the account, keeping broker and client id.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }
}

// ============================================================================
// Broker Order
// ============================================================================

/// Venue-bound order derived from a contract order.
///
/// Immutable: a re-price builds a replacement through
/// [`BrokerOrder::with_new_limit_price`] instead of editing this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerOrder {
    client_order_id: ClientOrderId,
    contract_order_id: u64,
    strategy_name: String,
    contract: FuturesContract,
    trade: Quantity,
    side: OrderSide,
    order_type: BrokerOrderType,
    benchmarks: BenchmarkPrices,
    limit_price: Option<Price>,
    identity: BrokerIdentity,
    created_at: DateTime<Utc>,
}

impl BrokerOrder {
    /// Build a broker order for a contract order.
    ///
    /// Never fails: every input has already been resolved by the caller.
    pub fn from_contract_order(
        order: &ContractOrder,
        order_type: BrokerOrderType,
        benchmarks: BenchmarkPrices,
        limit_price: Option<Price>,
        identity: BrokerIdentity,
    ) -> Self {
        Self {
            client_order_id: ClientOrderId::new(),
            contract_order_id: order.order_id(),
            strategy_name: order.strategy_name().to_string(),
            contract: order.contract().clone(),
            trade: order.trade(),
            side: order.side(),
            order_type,
            benchmarks,
            limit_price,
            identity,
            created_at: Utc::now(),
        }
    }

    /// Replacement order at a new limit price (cancel/replace).
    ///
    /// Keeps the trade, benchmarks and routing; gets a fresh client id.
    #[must_use]
    pub fn with_new_limit_price(&self, limit_price: Price) -> Self {
        Self {
            client_order_id: ClientOrderId::new(),
            limit_price: Some(limit_price),
            created_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn client_order_id(&self) -> &ClientOrderId {
        &self.client_order_id
    }

    pub fn contract_order_id(&self) -> u64 {
        self.contract_order_id
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn contract(&self) -> &FuturesContract {
        &self.contract
    }

    pub fn instrument_code(&self) -> &str {
        self.contract.instrument_code.as_str()
    }

    pub fn trade(&self) -> Quantity {
        self.trade
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn order_type(&self) -> BrokerOrderType {
        self.order_type
    }

    pub fn benchmarks(&self) -> BenchmarkPrices {
        self.benchmarks
    }

    pub fn limit_price(&self) -> Option<Price> {
        self.limit_price
    }

    pub fn identity(&self) -> &BrokerIdentity {
        &self.identity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl std::fmt::Display for BrokerOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.client_order_id, self.contract, self.trade, self.order_type, self.identity.broker
        )?;
        if let Some(limit) = self.limit_price {
            write!(f, " lmt {limit}")?;
        }
        if let Some(side_price) = self.benchmarks.side_price {
            write!(f, " side_px {side_price}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Broker-side lifecycle
// ============================================================================

/// State of a broker order in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderState {
    /// Sent but not yet acknowledged.
    #[default]
    Pending,
    /// Acknowledged and working at the venue.
    Open,
    /// Order partially filled.
    PartialFilled,
    /// Order completely filled.
    Filled,
    /// Order cancelled.
    Cancelled,
    /// Order rejected by the venue.
    Rejected,
}

impl OrderState {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }

    /// Returns true if the order is still active (can be cancelled).
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Open | Self::PartialFilled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::PartialFilled => "partial_filled",
            Self::Filled => "filled",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

/// Latest broker-side view of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusReport {
    pub state: OrderState,
    /// Signed filled quantity (same sign as the trade).
    pub filled_quantity: Quantity,
    pub average_fill_price: Option<Price>,
}

impl OrderStatusReport {
    /// Status of an order that has not been acknowledged yet.
    pub fn pending() -> Self {
        Self {
            state: OrderState::Pending,
            filled_quantity: Quantity::ZERO,
            average_fill_price: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl Default for OrderStatusReport {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contract() -> FuturesContract {
        FuturesContract::new("US10", "20241200").unwrap()
    }

    fn identity() -> BrokerIdentity {
        BrokerIdentity::new("paper", "DU123", 7)
    }

    #[test]
    fn test_contract_order_rejects_zero_trade() {
        let err = ContractOrder::new(1, "carry", contract(), Quantity::ZERO);
        assert!(matches!(err, Err(CoreError::InvalidQuantity(_))));
    }

    #[test]
    fn test_contract_order_side_from_sign() {
        let buy = ContractOrder::new(1, "carry", contract(), Quantity::from(2)).unwrap();
        let sell = ContractOrder::new(2, "carry", contract(), Quantity::from(-2)).unwrap();
        assert_eq!(buy.side(), OrderSide::Buy);
        assert_eq!(sell.side(), OrderSide::Sell);
    }

    #[test]
    fn test_log_attributes_include_identity_and_metadata() {
        let order = ContractOrder::new(42, "carry", contract(), Quantity::from(1))
            .unwrap()
            .with_metadata("parent", "7");
        let attrs = order.log_attributes();

        assert_eq!(attrs["instrument_code"], "US10");
        assert_eq!(attrs["contract_date"], "20241200");
        assert_eq!(attrs["contract_order_id"], "42");
        assert_eq!(attrs["strategy_name"], "carry");
        assert_eq!(attrs["parent"], "7");
    }

    #[test]
    fn test_broker_order_from_contract_order() {
        let order = ContractOrder::new(3, "trend", contract(), Quantity::from(-4)).unwrap();
        let benchmarks = BenchmarkPrices {
            side_price: Some(Price::new(dec!(110.5))),
            offside_price: Some(Price::new(dec!(110.515625))),
            mid_price: Some(Price::new(dec!(110.5078125))),
        };

        let broker_order = BrokerOrder::from_contract_order(
            &order,
            BrokerOrderType::Limit,
            benchmarks,
            Some(Price::new(dec!(110.5))),
            identity(),
        );

        assert_eq!(broker_order.contract_order_id(), 3);
        assert_eq!(broker_order.trade(), Quantity::from(-4));
        assert_eq!(broker_order.side(), OrderSide::Sell);
        assert_eq!(broker_order.benchmarks(), benchmarks);
        assert_eq!(broker_order.identity().account, "DU123");
    }

    #[test]
    fn test_reprice_builds_new_order() {
        let order = ContractOrder::new(3, "trend", contract(), Quantity::from(1)).unwrap();
        let original = BrokerOrder::from_contract_order(
            &order,
            BrokerOrderType::Limit,
            BenchmarkPrices::default(),
            Some(Price::new(dec!(100))),
            identity(),
        );

        let replacement = original.with_new_limit_price(Price::new(dec!(101)));

        assert_eq!(original.limit_price(), Some(Price::new(dec!(100))));
        assert_eq!(replacement.limit_price(), Some(Price::new(dec!(101))));
        assert_ne!(original.client_order_id(), replacement.client_order_id());
        assert_eq!(original.trade(), replacement.trade());
    }

    #[test]
    fn test_order_state_terminal() {
        assert!(OrderState::Filled.is_terminal());
        assert!(OrderState::Cancelled.is_terminal());
        assert!(OrderState::Rejected.is_terminal());
        assert!(!OrderState::Open.is_terminal());
        assert!(OrderState::PartialFilled.is_active());
    }
}
