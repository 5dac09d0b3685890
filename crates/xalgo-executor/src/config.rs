//! Execution configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algo::AlgoKind;
use crate::error::{ExecutorError, ExecutorResult};

/// Timeouts, management thresholds and algorithm selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum wait for a two-sided quote before giving up on an order.
    #[serde(default = "default_quote_wait_timeout_ms")]
    pub quote_wait_timeout_ms: u64,

    /// Delay between management steps of a live order.
    #[serde(default = "default_manage_poll_interval_ms")]
    pub manage_poll_interval_ms: u64,

    /// Market orders still working after this long are cancelled.
    #[serde(default = "default_market_order_timeout_ms")]
    pub market_order_timeout_ms: u64,

    /// Best-limit: time spent passive before crossing the spread.
    #[serde(default = "default_passive_time_limit_ms")]
    pub passive_time_limit_ms: u64,

    /// Best-limit: orders still working after this long are cancelled.
    #[serde(default = "default_total_time_limit_ms")]
    pub total_time_limit_ms: u64,

    /// Best-limit: adverse move (in ticks) since the reference tick that
    /// forces the switch to aggressive.
    #[serde(default = "default_adverse_move_ticks")]
    pub adverse_move_ticks: u32,

    /// Engine: management time after which cancellation is requested.
    #[serde(default = "default_max_management_time_ms")]
    pub max_management_time_ms: u64,

    /// Engine: extra time granted after a cancel request before the order
    /// is reported unresolved.
    #[serde(default = "default_cancel_grace_period_ms")]
    pub cancel_grace_period_ms: u64,

    /// Algorithm used when neither the order nor the instrument names one.
    #[serde(default = "default_algo")]
    pub default_algo: String,

    /// Per-instrument algorithm overrides (instrument code -> algo name).
    #[serde(default)]
    pub instrument_algos: HashMap<String, String>,

    /// Broker account override for every submission.
    #[serde(default)]
    pub broker_account: Option<String>,
}

fn default_quote_wait_timeout_ms() -> u64 {
    10_000
}

fn default_manage_poll_interval_ms() -> u64 {
    1_000
}

fn default_market_order_timeout_ms() -> u64 {
    600_000
}

fn default_passive_time_limit_ms() -> u64 {
    300_000
}

fn default_total_time_limit_ms() -> u64 {
    600_000
}

fn default_adverse_move_ticks() -> u32 {
    2
}

fn default_max_management_time_ms() -> u64 {
    900_000
}

fn default_cancel_grace_period_ms() -> u64 {
    30_000
}

fn default_algo() -> String {
    AlgoKind::BestLimit.as_str().to_string()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            quote_wait_timeout_ms: default_quote_wait_timeout_ms(),
            manage_poll_interval_ms: default_manage_poll_interval_ms(),
            market_order_timeout_ms: default_market_order_timeout_ms(),
            passive_time_limit_ms: default_passive_time_limit_ms(),
            total_time_limit_ms: default_total_time_limit_ms(),
            adverse_move_ticks: default_adverse_move_ticks(),
            max_management_time_ms: default_max_management_time_ms(),
            cancel_grace_period_ms: default_cancel_grace_period_ms(),
            default_algo: default_algo(),
            instrument_algos: HashMap::new(),
            broker_account: None,
        }
    }
}

impl ExecutionConfig {
    /// Check algorithm names and timing relationships.
    pub fn validate(&self) -> ExecutorResult<()> {
        self.default_algo.parse::<AlgoKind>()?;
        for algo in self.instrument_algos.values() {
            algo.parse::<AlgoKind>()?;
        }
        if self.manage_poll_interval_ms == 0 {
            return Err(ExecutorError::Config(
                "manage_poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.passive_time_limit_ms > self.total_time_limit_ms {
            return Err(ExecutorError::Config(format!(
                "passive_time_limit_ms ({}) exceeds total_time_limit_ms ({})",
                self.passive_time_limit_ms, self.total_time_limit_ms
            )));
        }
        Ok(())
    }

    pub fn quote_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_wait_timeout_ms)
    }

    pub fn manage_poll_interval(&self) -> Duration {
        Duration::from_millis(self.manage_poll_interval_ms)
    }

    pub fn market_order_timeout(&self) -> Duration {
        Duration::from_millis(self.market_order_timeout_ms)
    }

    pub fn passive_time_limit(&self) -> Duration {
        Duration::from_millis(self.passive_time_limit_ms)
    }

    pub fn total_time_limit(&self) -> Duration {
        Duration::from_millis(self.total_time_limit_ms)
    }

    pub fn max_management_time(&self) -> Duration {
        Duration::from_millis(self.max_management_time_ms)
    }

    pub fn cancel_grace_period(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutionConfig::default();
        assert_eq!(config.quote_wait_timeout(), Duration::from_secs(10));
        assert_eq!(config.passive_time_limit(), Duration::from_secs(300));
        assert_eq!(config.total_time_limit(), Duration::from_secs(600));
        assert_eq!(config.adverse_move_ticks, 2);
        assert_eq!(config.default_algo, "best_limit");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ExecutionConfig = toml::from_str(
            r#"
            quote_wait_timeout_ms = 2500
            default_algo = "market"

            [instrument_algos]
            GOLD = "input_limit"
            "#,
        )
        .unwrap();

        assert_eq!(config.quote_wait_timeout(), Duration::from_millis(2500));
        assert_eq!(config.manage_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.instrument_algos["GOLD"], "input_limit");
        assert!(config.broker_account.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_algo() {
        let mut config = ExecutionConfig::default();
        config
            .instrument_algos
            .insert("SOFR".to_string(), "twap".to_string());
        assert!(matches!(
            config.validate(),
            Err(ExecutorError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_validate_rejects_passive_longer_than_total() {
        let config = ExecutionConfig {
            passive_time_limit_ms: 700_000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExecutorError::Config(_))));
    }
}
