//! Core domain types for futures order execution.
//!
//! This crate provides fundamental types used throughout the execution pipeline:
//! - `FuturesContract`: instrument code + contract date
//! - `Price`, `Quantity`: precision-safe numeric types
//! - `Tick`, `BenchmarkPrices`: market data and the reference prices derived from it
//! - `ContractOrder`, `BrokerOrder`: the order before and after broker binding
//! - `OrderSide`, `BrokerOrderType`, `OrderState`: trading enums

pub mod contract;
pub mod decimal;
pub mod error;
pub mod execution;
pub mod order;
pub mod types;

pub use contract::{FuturesContract, InstrumentCode};
pub use decimal::{Price, Quantity};
pub use error::{CoreError, Result};
pub use execution::{BrokerIdentity, BrokerOrder, ContractOrder, OrderState, OrderStatusReport};
pub use order::{BrokerOrderType, ClientOrderId, OrderSide};
pub use types::{BenchmarkPrices, QuoteState, Tick, TickAnalysis};
