//! Paper session end to end: config text in, summary out.

use xalgo_bot::{AppConfig, AppError, PaperSession, SessionSummary};

const SESSION: &str = r#"
[broker]
name = "paper"
account = "PAPER-1"

[execution]
quote_wait_timeout_ms = 300
manage_poll_interval_ms = 5
passive_time_limit_ms = 0
default_algo = "best_limit"

[[tick_sizes]]
instrument = "GOLD"
tick_size = "0.1"

[[tick_sizes]]
instrument = "SOFR"
contract_date = "20250300"
tick_size = "0.005"

[[quotes]]
instrument = "GOLD"
contract_date = "20241200"
bid = "2400.0"
ask = "2400.2"

[[quotes]]
instrument = "SOFR"
contract_date = "20250300"
bid = "95.5"
ask = "95.505"
delay_ms = 20

# market buy, fills at the ask
[[orders]]
order_id = 1
instrument = "GOLD"
contract_date = "20241200"
trade = "2"
algo = "market"

# resting sell far above the market
[[orders]]
order_id = 2
instrument = "GOLD"
contract_date = "20241200"
trade = "-1"
limit_price = "2450.0"
algo = "input_limit"

# no quotes for this contract
[[orders]]
order_id = 3
instrument = "BUND"
contract_date = "20241200"
trade = "1"
algo = "market"

# passive, then crosses immediately and fills
[[orders]]
order_id = 4
instrument = "GOLD"
contract_date = "20241200"
trade = "1"

# quote arrives after the order starts waiting
[[orders]]
order_id = 5
instrument = "SOFR"
contract_date = "20250300"
trade = "-3"
algo = "market"
"#;

#[tokio::test]
async fn paper_session_runs_every_order() {
    let config = AppConfig::parse(SESSION).unwrap();
    let session = PaperSession::new(config).unwrap();
    let gateway = session.gateway().clone();

    let summary = session.run().await.unwrap();

    assert_eq!(
        summary,
        SessionSummary {
            orders: 5,
            not_submitted: 1,
            released: 1,
            completed: 3,
            unresolved: 0,
            failed: 0,
        }
    );
    assert_eq!(gateway.order_count(), 4);
}

#[tokio::test]
async fn unknown_algorithm_fails_only_that_order() {
    let mut config = AppConfig::parse(SESSION).unwrap();
    config.orders.truncate(1);
    config.orders[0].algo = Some("twap".to_string());

    let summary = PaperSession::new(config).unwrap().run().await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.orders, 1);
}

#[test]
fn crossed_quote_is_rejected_at_startup() {
    let mut config = AppConfig::parse(SESSION).unwrap();
    config.quotes[0].bid = config.quotes[0].ask + rust_decimal::Decimal::ONE;

    assert!(matches!(PaperSession::new(config), Err(AppError::Config(_))));
}

#[test]
fn locked_quote_is_accepted_at_startup() {
    let mut config = AppConfig::parse(SESSION).unwrap();
    config.quotes[0].bid = config.quotes[0].ask;

    assert!(PaperSession::new(config).is_ok());
}

#[test]
fn invalid_execution_config_is_rejected_at_startup() {
    let mut config = AppConfig::parse(SESSION).unwrap();
    config.execution.default_algo = "iceberg".to_string();

    assert!(matches!(PaperSession::new(config), Err(AppError::Executor(_))));
}
