//! Minimum tick size cache.
//!
//! Caches the minimum price increment per futures contract and detects
//! changes, which indicate the venue re-specified a contract while orders
//! may still be priced against the old grid.

use crate::error::{RegistryError, RegistryResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use xalgo_core::{FuturesContract, InstrumentCode, Price};

/// Tick size as it appears in configuration or reference data.
///
/// Without a `contract_date` the tick size applies to every contract of
/// the instrument that has no entry of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSizeSpec {
    pub instrument: String,
    #[serde(default)]
    pub contract_date: Option<String>,
    pub tick_size: Decimal,
}

/// Cache entry with change tracking.
#[derive(Debug, Clone)]
pub struct TickSizeEntry {
    pub tick_size: Price,
    pub last_update: DateTime<Utc>,
    pub version: u64,
}

/// Minimum tick size cache.
pub struct TickSizeCache {
    /// Contract-specific tick sizes.
    contracts: DashMap<FuturesContract, TickSizeEntry>,
    /// Instrument-wide fallback tick sizes.
    instruments: DashMap<InstrumentCode, TickSizeEntry>,
}

impl TickSizeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            contracts: DashMap::new(),
            instruments: DashMap::new(),
        }
    }

    /// Build a cache from reference data.
    pub fn from_specs(specs: &[TickSizeSpec]) -> RegistryResult<Self> {
        let cache = Self::new();
        for spec in specs {
            let tick_size = Price::new(spec.tick_size);
            match &spec.contract_date {
                Some(date) => {
                    let contract = FuturesContract::new(spec.instrument.as_str(), date)?;
                    cache.update(contract, tick_size)?;
                }
                None => {
                    cache.update_instrument(InstrumentCode::new(spec.instrument.as_str()), tick_size)?;
                }
            }
        }
        Ok(cache)
    }

    /// Minimum tick size for a contract.
    ///
    /// Falls back to the instrument-wide tick size. Fails with
    /// [`RegistryError::UnknownContract`] when neither is known.
    pub fn min_tick_size(&self, contract: &FuturesContract) -> RegistryResult<Price> {
        if let Some(entry) = self.contracts.get(contract) {
            return Ok(entry.tick_size);
        }
        self.instruments
            .get(&contract.instrument_code)
            .map(|entry| entry.tick_size)
            .ok_or_else(|| RegistryError::UnknownContract(contract.to_string()))
    }

    /// Update the tick size of one contract.
    ///
    /// Returns `Err(ParamChange)` and keeps the old value if a different
    /// tick size was already cached.
    pub fn update(&self, contract: FuturesContract, tick_size: Price) -> RegistryResult<()> {
        validate(&contract.to_string(), tick_size)?;
        let version = check_change(
            self.contracts.get(&contract).map(|e| e.value().clone()),
            &contract.to_string(),
            tick_size,
        )?;
        debug!(%contract, %tick_size, version, "Tick size cached");
        self.contracts.insert(contract, entry(tick_size, version));
        Ok(())
    }

    /// Update the instrument-wide fallback tick size.
    pub fn update_instrument(&self, instrument: InstrumentCode, tick_size: Price) -> RegistryResult<()> {
        validate(instrument.as_str(), tick_size)?;
        let version = check_change(
            self.instruments.get(&instrument).map(|e| e.value().clone()),
            instrument.as_str(),
            tick_size,
        )?;
        debug!(%instrument, %tick_size, version, "Instrument tick size cached");
        self.instruments.insert(instrument, entry(tick_size, version));
        Ok(())
    }

    /// Cache entry for a contract (contract-specific entries only).
    pub fn entry(&self, contract: &FuturesContract) -> Option<TickSizeEntry> {
        self.contracts.get(contract).map(|e| e.value().clone())
    }

    /// Check if a tick size is known for a contract, directly or by fallback.
    pub fn contains(&self, contract: &FuturesContract) -> bool {
        self.contracts.contains_key(contract)
            || self.instruments.contains_key(&contract.instrument_code)
    }

    /// Remove a contract's own entry.
    pub fn remove(&self, contract: &FuturesContract) -> Option<Price> {
        self.contracts.remove(contract).map(|(_, e)| e.tick_size)
    }

    /// Number of contract-specific entries.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty() && self.instruments.is_empty()
    }
}

impl Default for TickSizeCache {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(key: &str, tick_size: Price) -> RegistryResult<()> {
    if tick_size.is_positive() {
        Ok(())
    } else {
        Err(RegistryError::InvalidTickSize {
            contract: key.to_string(),
            tick_size: tick_size.to_string(),
        })
    }
}

fn check_change(existing: Option<TickSizeEntry>, key: &str, tick_size: Price) -> RegistryResult<u64> {
    match existing {
        Some(existing) if existing.tick_size != tick_size => {
            let msg = format!("{key}: tick_size {}->{tick_size}", existing.tick_size);
            error!(%msg, "TICK SIZE CHANGE DETECTED");
            Err(RegistryError::ParamChange(msg))
        }
        Some(existing) => Ok(existing.version + 1),
        None => Ok(1),
    }
}

fn entry(tick_size: Price, version: u64) -> TickSizeEntry {
    TickSizeEntry {
        tick_size,
        last_update: Utc::now(),
        version,
    }
}
