//! Trade command implementation

use anyhow::{Context, Result};
use quantum_trader::{PairOutcome, TradeOutcome, TradingPair};
use tracing::info;

use super::{build_runner, load_config, load_usage, print_json};

pub fn run(
    config_path: &str,
    network: &str,
    base: &str,
    quote: &str,
    amount: Option<f64>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut usage = load_usage(&config)?;
    let mut runner = build_runner(&config);

    let pair = TradingPair::new(base.to_uppercase(), quote.to_uppercase());
    match amount {
        Some(amount) => info!("Trading {} on {} with fixed amount {}", pair, network, amount),
        None => info!("Trading {} on {} with confidence-scaled size", pair, network),
    }
    let result = runner.trade_pair(network, &pair, amount, &mut usage);

    // Jobs already ran even when the trade itself failed
    usage
        .save(&config.storage.usage)
        .context("Failed to save quantum usage")?;

    let outcome = result?;
    if let PairOutcome::Completed {
        trade_result: TradeOutcome::NoTrade { reason, detail },
        ..
    } = &outcome
    {
        info!("No trade: {} ({})", reason, detail);
    }
    print_json(&outcome)
}
