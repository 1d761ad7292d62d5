//! Run command implementation

use anyhow::{Context, Result};
use tracing::info;

use super::{build_runner, load_config, load_usage, print_json};

pub fn run(config_path: &str, network: &str) -> Result<()> {
    info!("Starting trading cycle");
    let config = load_config(config_path)?;
    let mut usage = load_usage(&config)?;
    let mut runner = build_runner(&config);

    let target = if network.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(network)
    };
    let report = runner.run_cycle(target, &mut usage)?;

    usage
        .save(&config.storage.usage)
        .context("Failed to save quantum usage")?;
    info!(
        "Trade history: {} ({} jobs recorded in total)",
        runner.history().path().display(),
        usage.total_jobs()
    );

    print_json(&report)
}
