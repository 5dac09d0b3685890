//! Broker connection abstraction.
//!
//! Algorithms never talk to a venue directly. Everything they need from the
//! broker side (routing identity, contract metadata, market data, order
//! entry) goes through [`BrokerGateway`], so tests and paper trading can
//! swap in their own implementation.

use std::fmt;
use std::sync::Arc;

use xalgo_core::{BrokerIdentity, BrokerOrder, ContractOrder, FuturesContract, OrderStatusReport, Price};
use xalgo_feed::{BoxFuture, DynTicker};
use xalgo_registry::RegistryResult;

use crate::algo::submission::SubmissionOutcome;
use crate::handle::MonitoredOrder;

/// Broker-side handle of a live order.
pub trait OrderControl: Send + Sync + fmt::Debug {
    /// Identifier assigned by the broker.
    fn broker_order_id(&self) -> &str;

    /// Latest status as seen by the broker.
    fn status(&self) -> OrderStatusReport;
}

/// Shared handle to a broker-side order.
pub type DynOrderControl = Arc<dyn OrderControl>;

/// Brokerage connection used by the execution algorithms.
pub trait BrokerGateway: Send + Sync {
    /// Broker name, default account and client id for new orders.
    fn identity(&self) -> BrokerIdentity;

    /// Minimum price increment of a contract.
    ///
    /// Fails with `RegistryError::UnknownContract` when the broker publishes
    /// no tick size for it.
    fn min_tick_size(&self, contract: &FuturesContract) -> RegistryResult<Price>;

    /// Fresh market data handle for an order's contract and direction.
    fn ticker_for(&self, order: &ContractOrder) -> DynTicker;

    /// Send a broker order.
    ///
    /// Transport failures and venue rejections come back as
    /// `SubmissionOutcome::NoOrder`, never as a panic or error.
    fn submit(&self, order: BrokerOrder) -> BoxFuture<'_, SubmissionOutcome>;

    /// Request cancellation of a live order. Returns whether the broker
    /// accepted the request.
    fn cancel<'a>(&'a self, order: &'a MonitoredOrder) -> BoxFuture<'a, bool>;

    /// Replace a live order with `replacement` (cancel/replace). Returns
    /// whether the broker accepted the modification; on `false` the
    /// original order keeps working unchanged.
    fn modify_limit_price<'a>(
        &'a self,
        order: &'a MonitoredOrder,
        replacement: BrokerOrder,
    ) -> BoxFuture<'a, bool>;
}

/// Arc wrapper for BrokerGateway trait objects.
pub type DynBrokerGateway = Arc<dyn BrokerGateway>;
