//! Application configuration.

use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use xalgo_core::{BrokerIdentity, ContractOrder, FuturesContract, Price, Quantity};
use xalgo_executor::ExecutionConfig;
use xalgo_registry::TickSizeSpec;

/// Broker routing identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_name")]
    pub name: String,
    #[serde(default = "default_broker_account")]
    pub account: String,
    #[serde(default = "default_client_id")]
    pub client_id: u32,
}

fn default_broker_name() -> String {
    "paper".to_string()
}

fn default_broker_account() -> String {
    "PAPER".to_string()
}

fn default_client_id() -> u32 {
    1
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            name: default_broker_name(),
            account: default_broker_account(),
            client_id: default_client_id(),
        }
    }
}

impl BrokerConfig {
    pub fn identity(&self) -> BrokerIdentity {
        BrokerIdentity::new(&self.name, &self.account, self.client_id)
    }
}

/// Simulated top-of-book quote for the paper broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperQuoteConfig {
    pub instrument: String,
    pub contract_date: String,
    pub bid: Decimal,
    pub ask: Decimal,
    #[serde(default = "default_quote_size")]
    pub bid_size: Decimal,
    #[serde(default = "default_quote_size")]
    pub ask_size: Decimal,
    /// Publish after this delay instead of at startup.
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_quote_size() -> Decimal {
    Decimal::from(10)
}

/// One contract order to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    pub order_id: u64,
    pub instrument: String,
    pub contract_date: String,
    /// Signed quantity: positive buys, negative sells.
    pub trade: Decimal,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    /// Algorithm name; falls back to the execution configuration.
    #[serde(default)]
    pub algo: Option<String>,
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

fn default_strategy() -> String {
    "manual".to_string()
}

impl OrderConfig {
    pub fn to_contract_order(&self) -> AppResult<ContractOrder> {
        let contract = FuturesContract::new(self.instrument.as_str(), &self.contract_date)?;
        let mut order = ContractOrder::new(
            self.order_id,
            &self.strategy,
            contract,
            Quantity::new(self.trade),
        )?;
        if let Some(limit) = self.limit_price {
            order = order.with_limit_price(Price::new(limit));
        }
        if let Some(algo) = &self.algo {
            order = order.with_algo(algo);
        }
        Ok(order)
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Tick sizes known to the paper broker.
    #[serde(default)]
    pub tick_sizes: Vec<TickSizeSpec>,

    #[serde(default)]
    pub quotes: Vec<PaperQuoteConfig>,

    #[serde(default)]
    pub orders: Vec<OrderConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Check execution settings and order ids.
    pub fn validate(&self) -> AppResult<()> {
        self.execution.validate()?;
        let mut ids: Vec<u64> = self.orders.iter().map(|o| o.order_id).collect();
        ids.sort_unstable();
        if let Some(w) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(AppError::Config(format!("duplicate order_id {}", w[0])));
        }
        for quote in &self.quotes {
            if quote.bid > quote.ask {
                return Err(AppError::Config(format!(
                    "quote for {}/{} is crossed: bid {} > ask {}",
                    quote.instrument, quote.contract_date, quote.bid, quote.ask
                )));
            }
        }
        Ok(())
    }

    pub fn contract_orders(&self) -> AppResult<Vec<ContractOrder>> {
        self.orders.iter().map(OrderConfig::to_contract_order).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        [broker]
        account = "DU12345"

        [execution]
        default_algo = "market"

        [[tick_sizes]]
        instrument = "GOLD"
        tick_size = "0.1"

        [[quotes]]
        instrument = "GOLD"
        contract_date = "20241200"
        bid = "2400.0"
        ask = "2400.2"

        [[orders]]
        order_id = 1
        instrument = "GOLD"
        contract_date = "20241200"
        trade = "-2"
        limit_price = "2400.3"
        algo = "input_limit"
    "#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.broker.name, "paper");
        assert_eq!(config.broker.account, "DU12345");
        assert_eq!(config.execution.default_algo, "market");
        assert_eq!(config.execution.quote_wait_timeout_ms, 10_000);
        assert_eq!(config.quotes[0].bid_size, dec!(10));
        assert!(config.validate().is_ok());

        let orders = config.contract_orders().unwrap();
        assert_eq!(orders[0].trade(), Quantity::new(dec!(-2)));
        assert_eq!(orders[0].algo_to_use(), Some("input_limit"));
        assert_eq!(orders[0].strategy_name(), "manual");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.broker.identity(), BrokerIdentity::new("paper", "PAPER", 1));
        assert!(config.orders.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_order_ids_rejected() {
        let mut config = AppConfig::parse(SAMPLE).unwrap();
        config.orders.push(config.orders[0].clone());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_trade_rejected() {
        let mut config = AppConfig::parse(SAMPLE).unwrap();
        config.orders[0].trade = dec!(0);
        assert!(matches!(config.contract_orders(), Err(AppError::Order(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/xalgo.toml"),
            Err(AppError::Config(_))
        ));
    }
}
