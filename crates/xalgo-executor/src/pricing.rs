//! Limit price resolution.
//!
//! Picks the raw limit price from the configured source and rounds it onto
//! the contract's tick grid. When the broker publishes no tick size the
//! price goes out unrounded and the fallback is logged and counted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use xalgo_core::{BenchmarkPrices, ContractOrder, Price};
use xalgo_registry::RegistryError;
use xalgo_telemetry::Metrics;

use crate::error::{ExecutorError, ExecutorResult};
use crate::gateway::DynBrokerGateway;

/// Where a limit price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPriceSource {
    /// Caller-supplied price.
    #[default]
    Input,
    /// Price that trades immediately (ask for buys, bid for sells).
    SidePrice,
    /// Passive price on the near touch (bid for buys, ask for sells).
    OffsidePrice,
}

impl LimitPriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::SidePrice => "side_price",
            Self::OffsidePrice => "offside_price",
        }
    }
}

impl fmt::Display for LimitPriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimitPriceSource {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "side_price" => Ok(Self::SidePrice),
            "offside_price" => Ok(Self::OffsidePrice),
            other => Err(ExecutorError::InvalidPricingConfiguration(format!(
                "unknown limit price source '{other}'"
            ))),
        }
    }
}

/// Raw (unrounded) limit price for `source`.
///
/// Fails when the source has nothing to offer: no input price for
/// [`LimitPriceSource::Input`], or a missing benchmark field.
pub fn resolve_limit_price(
    source: LimitPriceSource,
    benchmarks: &BenchmarkPrices,
    input_limit_price: Option<Price>,
) -> ExecutorResult<Price> {
    let price = match source {
        LimitPriceSource::Input => input_limit_price,
        LimitPriceSource::SidePrice => benchmarks.side_price,
        LimitPriceSource::OffsidePrice => benchmarks.offside_price,
    };
    price.ok_or_else(|| {
        ExecutorError::InvalidPricingConfiguration(format!("no price available from source {source}"))
    })
}

/// `tick * round(price / tick)`, ties to even.
pub fn round_to_tick(price: Price, tick_size: Price) -> Price {
    price.round_to_tick(tick_size)
}

/// Resolves and rounds limit prices against the broker's tick sizes.
#[derive(Clone)]
pub struct LimitPriceResolver {
    gateway: DynBrokerGateway,
}

impl LimitPriceResolver {
    pub fn new(gateway: DynBrokerGateway) -> Self {
        Self { gateway }
    }

    /// Limit price for a new broker order.
    pub fn limit_price_for(
        &self,
        order: &ContractOrder,
        source: LimitPriceSource,
        benchmarks: &BenchmarkPrices,
        input_limit_price: Option<Price>,
    ) -> ExecutorResult<Price> {
        let raw = resolve_limit_price(source, benchmarks, input_limit_price)?;
        Ok(self.round_for(order, raw))
    }

    /// Round `price` to the order's contract tick.
    ///
    /// An unknown contract leaves the price unrounded.
    pub fn round_for(&self, order: &ContractOrder, price: Price) -> Price {
        match self.gateway.min_tick_size(order.contract()) {
            Ok(tick_size) => round_to_tick(price, tick_size),
            Err(RegistryError::UnknownContract(_)) => {
                warn!(
                    instrument = %order.instrument_code(),
                    contract = %order.contract(),
                    order_id = order.order_id(),
                    strategy = %order.strategy_name(),
                    limit_price = %price,
                    "Couldn't find min tick size, not rounding limit price"
                );
                Metrics::tick_size_fallback(order.instrument_code());
                price
            }
            Err(e) => {
                warn!(
                    instrument = %order.instrument_code(),
                    contract = %order.contract(),
                    order_id = order.order_id(),
                    error = %e,
                    limit_price = %price,
                    "Tick size lookup failed, not rounding limit price"
                );
                Metrics::tick_size_fallback(order.instrument_code());
                price
            }
        }
    }
}
