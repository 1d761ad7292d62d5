//! Balance command implementation

use anyhow::Result;
use quantum_trader::wallet::{TokenBalance, WalletClient};
use std::collections::BTreeMap;

use super::{load_config, print_json};

pub fn run(config_path: &str, network: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let wallet = config.build_wallet();

    let networks: Vec<String> = match network {
        Some(name) => vec![name.to_string()],
        None => config.wallet.networks.keys().cloned().collect(),
    };

    let mut balances: BTreeMap<String, BTreeMap<String, TokenBalance>> = BTreeMap::new();
    for name in networks {
        let tokens = wallet.get_balances(&name)?;
        balances.insert(name, tokens);
    }

    print_json(&balances)
}
