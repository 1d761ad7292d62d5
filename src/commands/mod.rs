//! Subcommand implementations

pub mod analyze;
pub mod balance;
pub mod performance;
pub mod run;
pub mod test_circuit;
pub mod trade;

use anyhow::{Context, Result};
use quantum_trader::quantum::UsageTracker;
use quantum_trader::{Config, CycleRunner};
use tracing::info;

/// Load and validate the configuration, logging its fingerprint
pub fn load_config(config_path: &str) -> Result<Config> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;
    info!(
        "Loaded configuration from {} (fingerprint {})",
        config_path,
        config.fingerprint()?
    );
    Ok(config)
}

/// Runner wired to the configured market data, local simulator and paper wallet
pub fn build_runner(config: &Config) -> CycleRunner {
    CycleRunner::new(
        config,
        config.build_market_data(),
        Box::new(config.build_executor()),
        Box::new(config.build_wallet()),
    )
}

pub fn load_usage(config: &Config) -> Result<UsageTracker> {
    UsageTracker::load(&config.storage.usage)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
