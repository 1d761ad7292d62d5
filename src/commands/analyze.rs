//! Analyze command implementation

use anyhow::{Context, Result};
use quantum_trader::TradingPair;
use tracing::info;

use super::{build_runner, load_config, load_usage, print_json};

pub fn run(config_path: &str, network: &str, base: &str, quote: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let mut usage = load_usage(&config)?;
    let mut runner = build_runner(&config);

    let pair = TradingPair::new(base.to_uppercase(), quote.to_uppercase());
    let analysis = runner.analyze_pair(network, &pair, &mut usage)?;
    info!(
        "{} on {}: {} regime, {} {:.3}",
        pair, network, analysis.market.regime, analysis.signal.action, analysis.signal.confidence
    );

    usage
        .save(&config.storage.usage)
        .context("Failed to save quantum usage")?;
    print_json(&analysis)
}
