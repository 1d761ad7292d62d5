//! Test command: run a Bell circuit end to end through the executor

use anyhow::Result;
use quantum_trader::quantum::{CircuitDescriptor, QuantumExecutor};
use tracing::info;

use super::{load_config, load_usage, print_json};

pub fn run(config_path: &str, shots: Option<u32>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut usage = load_usage(&config)?;
    let mut executor = config.build_executor();
    let shots = shots.unwrap_or(config.quantum.shots);

    info!("Backends: {}", executor.backend_names().join(", "));
    let outcome = executor.execute(&CircuitDescriptor::Bell, shots, config.quantum.allow_simulator)?;
    usage.record_job(&outcome.backend_id, config.quantum.credits_per_job);
    usage.save(&config.storage.usage)?;

    for (bits, p) in outcome.distribution.ranked() {
        info!("|{}> {:.4}", bits, p);
    }
    print_json(&outcome)
}
