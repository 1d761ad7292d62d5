//! Performance command implementation

use anyhow::Result;
use quantum_trader::history::TradeHistory;
use tracing::info;

use super::{load_config, print_json};

pub fn run(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let history = TradeHistory::new(&config.storage.trade_history);
    let metrics = history.performance_metrics()?;

    if metrics.total_trades == 0 {
        info!("No trade history available at {}", history.path().display());
    }
    print_json(&metrics)
}
