//! Instrument and futures contract identification.
//!
//! A futures contract is an instrument code plus a contract date. The
//! contract date is `YYYYMMDD`; the day may be `00` when the venue only
//! identifies the expiry month (e.g. `20240300`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Instrument identifier (e.g. "SOFR", "US10", "GOLD").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentCode(String);

impl InstrumentCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstrumentCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A specific futures contract.
///
/// This is the key for tick size metadata and market data subscriptions.
/// Format: `{instrument}/{contract_date}` (e.g. "SOFR/20240300").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FuturesContract {
    pub instrument_code: InstrumentCode,
    pub contract_date: String,
}

impl FuturesContract {
    /// Create a contract, validating the `YYYYMMDD` contract date.
    pub fn new(instrument_code: impl Into<InstrumentCode>, contract_date: &str) -> Result<Self> {
        let instrument_code = instrument_code.into();
        if instrument_code.as_str().is_empty() {
            return Err(CoreError::InvalidContract(
                "empty instrument code".to_string(),
            ));
        }
        validate_contract_date(contract_date)?;
        Ok(Self {
            instrument_code,
            contract_date: contract_date.to_string(),
        })
    }

    /// Expiry year and month.
    pub fn year_month(&self) -> (u32, u32) {
        // validated on construction
        let year = self.contract_date[0..4].parse().unwrap_or(0);
        let month = self.contract_date[4..6].parse().unwrap_or(0);
        (year, month)
    }

    /// Returns the canonical string representation.
    pub fn as_string(&self) -> String {
        format!("{}/{}", self.instrument_code, self.contract_date)
    }
}

fn validate_contract_date(date: &str) -> Result<()> {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidContract(format!(
            "contract date must be YYYYMMDD, got {date:?}"
        )));
    }
    let month: u32 = date[4..6].parse().unwrap_or(0);
    let day: u32 = date[6..8].parse().unwrap_or(99);
    if !(1..=12).contains(&month) || day > 31 {
        return Err(CoreError::InvalidContract(format!(
            "contract date out of range: {date}"
        )));
    }
    Ok(())
}

impl fmt::Display for FuturesContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instrument_code, self.contract_date)
    }
}

impl FromStr for FuturesContract {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let (instrument, date) = s
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidContract(format!("expected INSTRUMENT/YYYYMMDD, got {s:?}")))?;
        Self::new(instrument, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_display_roundtrip() {
        let contract = FuturesContract::new("SOFR", "20240300").unwrap();
        assert_eq!(contract.to_string(), "SOFR/20240300");
        assert_eq!("SOFR/20240300".parse::<FuturesContract>().unwrap(), contract);
    }

    #[test]
    fn test_contract_year_month() {
        let contract = FuturesContract::new("GOLD", "20241227").unwrap();
        assert_eq!(contract.year_month(), (2024, 12));
    }

    #[test]
    fn test_contract_rejects_bad_dates() {
        assert!(FuturesContract::new("GOLD", "202412").is_err());
        assert!(FuturesContract::new("GOLD", "20241327").is_err());
        assert!(FuturesContract::new("GOLD", "2024ab01").is_err());
        assert!(FuturesContract::new("", "20241227").is_err());
        assert!("GOLD20241227".parse::<FuturesContract>().is_err());
    }
}
