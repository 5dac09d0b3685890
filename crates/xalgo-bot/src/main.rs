//! xalgo paper execution runner - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Execute contract orders against the paper broker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via XALGO_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Print Prometheus metrics after the session
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    xalgo_telemetry::init_logging()?;

    info!("Starting xalgo v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > XALGO_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("XALGO_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = xalgo_bot::AppConfig::from_file(&config_path)?;
    info!(
        orders = config.orders.len(),
        default_algo = %config.execution.default_algo,
        "Configuration loaded"
    );

    let session = xalgo_bot::PaperSession::new(config)?;
    let summary = session.run().await?;
    info!(summary = %serde_json::to_string(&summary)?, "Session finished");

    if args.metrics {
        println!("{}", xalgo_telemetry::Metrics::gather_text());
    }

    Ok(())
}
